use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::apis::ImageProvider;
use crate::apis::huggingface::ProviderError;
use crate::bot::{TdError, TdResult};
use crate::utilities::transient_store::{PersistenceError, TransientStore};

pub const GENERATING_TEXT: &str = "🖼️✨ Generating your image... Please wait a moment! ⏳🎨";

/// The messaging side of the relay.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: String) -> TdResult<()>;

    /// Sends a local image file. Returns once the upload has finished, after
    /// which the file may be deleted.
    async fn send_photo(&self, chat_id: i64, path: &Path, caption: String) -> TdResult<()>;
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("generation failed: {0}")]
    Provider(#[from] ProviderError),
    #[error("save failed: {0}")]
    Persistence(#[from] PersistenceError),
    #[error("send failed: {}: {}", .0.code, .0.message)]
    Delivery(TdError),
}

impl RelayError {
    /// The text shown to the user who sent the prompt.
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(err) => format!("An error occurred: {err}"),
            Self::Persistence(PersistenceError::Write(err)) => {
                format!("An error occurred while saving the image: {err}")
            }
            Self::Persistence(PersistenceError::Missing) => {
                "Failed to save the image. Please try again later.".into()
            }
            Self::Delivery(_) => "Failed to send the image. Please try again later.".into(),
        }
    }
}

pub fn caption(prompt: &str) -> String {
    format!("🎉 Here is your generated image based on the prompt: {prompt} 🖼️✨")
}

/// Turns a chat message into a generated photo sent back to the same chat.
pub struct Relay {
    chat: Arc<dyn ChatClient>,
    provider: Arc<dyn ImageProvider>,
    store: TransientStore,
}

impl Relay {
    pub fn new(
        chat: Arc<dyn ChatClient>,
        provider: Arc<dyn ImageProvider>,
        store: TransientStore,
    ) -> Self {
        Self { chat, provider, store }
    }

    /// Runs one pipeline to completion. Every failure ends up as a chat message.
    pub async fn handle_message(&self, chat_id: i64, prompt: String) {
        log::info!("generating {prompt:?} for chat {chat_id}");

        if let Err(err) = self.chat.send_text(chat_id, GENERATING_TEXT.into()).await {
            log::warn!(
                "TDLib error occurred while acknowledging a prompt: {}: {}",
                err.code,
                err.message
            );
        }

        let Err(err) = self.relay(chat_id, &prompt).await else {
            log::info!("delivered {prompt:?} to chat {chat_id}");
            return;
        };

        log::error!("{err} (chat {chat_id})");

        if let Err(err) = self.chat.send_text(chat_id, err.user_message()).await {
            log::error!(
                "TDLib error occurred while reporting the previous error: {}: {}",
                err.code,
                err.message
            );
        }
    }

    async fn relay(&self, chat_id: i64, prompt: &str) -> Result<(), RelayError> {
        let stream = self.provider.generate(prompt).await?;
        let image = self.store.save(stream).await?;

        let result = self.chat.send_photo(chat_id, image.path(), caption(prompt)).await;

        let path = image.path().to_path_buf();
        if let Err(err) = image.remove() {
            log::warn!("failed to remove {}: {err}", path.display());
        }

        result.map_err(RelayError::Delivery)
    }
}
