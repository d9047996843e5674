use std::error::Error;
use std::io;

use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt};
use reqwest::header::AUTHORIZATION;
use reqwest::{StatusCode, Url};
use serde::Serialize;

use super::{ImageProvider, ImageStream};

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("invalid provider URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("{}", describe_request_error(.0))]
    Request(reqwest::Error),
    #[error("Error: {}", status_text(.0))]
    Status(StatusCode),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err.without_url())
    }
}

fn describe_request_error(err: &reqwest::Error) -> String {
    err.source().map_or_else(|| err.to_string(), |source| format!("{err}: {source}"))
}

fn status_text(status: &StatusCode) -> &str {
    status.canonical_reason().unwrap_or_else(|| status.as_str())
}

/// Text-to-image client for the Hugging Face inference API.
pub struct HuggingFaceClient {
    http_client: reqwest::Client,
    url: String,
    api_key: String,
}

impl HuggingFaceClient {
    pub fn new(http_client: reqwest::Client, url: String, api_key: String) -> Self {
        Self { http_client, url, api_key }
    }
}

#[async_trait]
impl ImageProvider for HuggingFaceClient {
    async fn generate(&self, prompt: &str) -> Result<ImageStream, ProviderError> {
        let url = Url::parse(&self.url)?;

        let response = self
            .http_client
            .post(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&InferenceRequest { inputs: prompt })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status()));
        }

        Ok(response.bytes_stream().map_err(io::Error::other).boxed())
    }
}
