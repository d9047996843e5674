use std::fs;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{StreamExt, stream};
use reqwest::StatusCode;
use tdlib::enums::MessageContent;
use tdlib::types::{FormattedText, MessageText};

use crate::apis::huggingface::ProviderError;
use crate::apis::{ImageProvider, ImageStream};
use crate::bot::{TdError, TdResult};
use crate::relay::ChatClient;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sent {
    Text { chat_id: i64, text: String },
    /// `contents` is what the file held at send time.
    Photo { chat_id: i64, caption: String, contents: Option<Vec<u8>> },
}

/// Records everything the relay sends.
#[derive(Default)]
pub struct FakeChat {
    sent: Mutex<Vec<Sent>>,
    fail_texts: bool,
    fail_photos: bool,
}

impl FakeChat {
    pub fn failing_texts() -> Self {
        Self { fail_texts: true, ..Self::default() }
    }

    pub fn failing_photos() -> Self {
        Self { fail_photos: true, ..Self::default() }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }
}

fn td_error(message: &str) -> TdError {
    TdError { code: 400, message: message.into() }
}

#[async_trait]
impl ChatClient for FakeChat {
    async fn send_text(&self, chat_id: i64, text: String) -> TdResult<()> {
        if self.fail_texts {
            return Err(td_error("CHAT_WRITE_FORBIDDEN"));
        }

        self.sent.lock().unwrap().push(Sent::Text { chat_id, text });
        Ok(())
    }

    async fn send_photo(&self, chat_id: i64, path: &Path, caption: String) -> TdResult<()> {
        tokio::task::yield_now().await;
        let contents = fs::read(path).ok();
        self.sent.lock().unwrap().push(Sent::Photo { chat_id, caption, contents });

        if self.fail_photos { Err(td_error("PHOTO_SAVE_FILE_INVALID")) } else { Ok(()) }
    }
}

enum Script {
    Chunks(Mutex<Option<Vec<io::Result<Bytes>>>>),
    Image(Vec<u8>),
    Status(StatusCode),
}

/// Answers every prompt the same way.
pub struct FakeProvider {
    script: Script,
    prompts: Mutex<Vec<String>>,
}

impl FakeProvider {
    fn new(script: Script) -> Self {
        Self { script, prompts: Mutex::new(Vec::new()) }
    }

    pub fn image(image: Vec<u8>) -> Self {
        Self::new(Script::Image(image))
    }

    pub fn status(status: StatusCode) -> Self {
        Self::new(Script::Status(status))
    }

    /// Streams `chunks` once; later calls get an empty stream.
    pub fn chunks(chunks: Vec<io::Result<Bytes>>) -> Self {
        Self::new(Script::Chunks(Mutex::new(Some(chunks))))
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageProvider for FakeProvider {
    async fn generate(&self, prompt: &str) -> Result<ImageStream, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.into());

        match &self.script {
            Script::Chunks(chunks) => {
                Ok(stream::iter(chunks.lock().unwrap().take().unwrap_or_default()).boxed())
            }
            Script::Image(image) => {
                let (head, tail) = image.split_at(image.len() / 2);
                let chunks = vec![Ok(Bytes::copy_from_slice(head)), Ok(Bytes::copy_from_slice(tail))];
                Ok(stream::iter(chunks).boxed())
            }
            Script::Status(status) => Err(ProviderError::Status(*status)),
        }
    }
}

pub fn text_content(text: &str) -> MessageContent {
    MessageContent::MessageText(MessageText {
        text: FormattedText { text: text.into(), ..Default::default() },
        ..Default::default()
    })
}
