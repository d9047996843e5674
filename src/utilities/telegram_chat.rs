use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tdlib::enums::{self, InputFile, InputMessageContent};
use tdlib::functions;
use tdlib::types::{
    FormattedText, InputFileLocal, InputMessagePhoto, InputMessageText, LinkPreviewOptions,
};

use super::message_queue::MessageQueue;
use crate::bot::TdResult;
use crate::relay::ChatClient;

/// [`ChatClient`] backed by a TDLib client.
pub struct TelegramChat {
    client_id: i32,
    message_queue: Arc<MessageQueue>,
}

impl TelegramChat {
    pub const fn new(client_id: i32, message_queue: Arc<MessageQueue>) -> Self {
        Self { client_id, message_queue }
    }

    /// Sends `content` and waits until TDLib has delivered it.
    async fn send(&self, chat_id: i64, content: InputMessageContent) -> TdResult<i64> {
        let enums::Message::Message(message) =
            functions::send_message(chat_id, 0, None, None, None, content, self.client_id).await?;

        self.message_queue.wait_for_message(message.id).await
    }
}

#[async_trait]
impl ChatClient for TelegramChat {
    async fn send_text(&self, chat_id: i64, text: String) -> TdResult<()> {
        self.send(
            chat_id,
            InputMessageContent::InputMessageText(InputMessageText {
                text: FormattedText { text, ..Default::default() },
                link_preview_options: Some(LinkPreviewOptions {
                    is_disabled: true,
                    ..Default::default()
                }),
                ..Default::default()
            }),
        )
        .await?;

        Ok(())
    }

    async fn send_photo(&self, chat_id: i64, path: &Path, caption: String) -> TdResult<()> {
        // the local file has to stay around until the upload is done
        self.send(
            chat_id,
            InputMessageContent::InputMessagePhoto(InputMessagePhoto {
                photo: InputFile::Local(InputFileLocal {
                    path: path.to_string_lossy().into_owned(),
                }),
                thumbnail: None,
                added_sticker_file_ids: Vec::new(),
                width: 0,
                height: 0,
                caption: Some(FormattedText { text: caption, ..Default::default() }),
                show_caption_above_media: false,
                self_destruct_type: None,
                has_spoiler: false,
            }),
        )
        .await?;

        Ok(())
    }
}
