use std::io;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;

pub mod huggingface;

/// Raw image bytes as they arrive from the provider.
pub type ImageStream = BoxStream<'static, io::Result<Bytes>>;

#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Requests one image for `prompt`. The caller must consume the stream.
    async fn generate(&self, prompt: &str) -> Result<ImageStream, huggingface::ProviderError>;
}
