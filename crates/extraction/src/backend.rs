//! Extraction backends.
//!
//! The session only needs [`ExtractionBackend`]; [`HttpBackend`] talks to the
//! hosted extraction API.

use crate::cancel::CancelHandle;
use crate::config::Settings;
use crate::document::Document;
use crate::error::ExtractionError;
use crate::types::{ExtractionConfig, ExtractionResult};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::debug;

/// A service that turns a document into an [`ExtractionResult`].
///
/// Implementations should stop work once `cancel` fires and report that with
/// [`ExtractionError::Cancelled`], so it is never confused with a failure.
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    async fn extract(
        &self,
        document: &Document,
        config: &ExtractionConfig,
        cancel: &CancelHandle,
    ) -> Result<ExtractionResult, ExtractionError>;
}

/// Backend that posts the document as a multipart form.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a backend rooted at `base_url`. No request timeout is applied.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.api_url.clone())
    }

    /// Use a preconfigured HTTP client.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// `{base}/{tool}/process-output`, or `{base}/{tool}/` without processing.
    pub fn endpoint(&self, config: &ExtractionConfig) -> String {
        let suffix = if config.process_output {
            "process-output"
        } else {
            ""
        };
        format!("{}/{}/{}", self.base_url, config.tool, suffix)
    }

    async fn send(
        &self,
        document: &Document,
        config: &ExtractionConfig,
    ) -> Result<ExtractionResult, ExtractionError> {
        let file = Part::bytes(document.bytes().to_vec())
            .file_name(document.name().to_string())
            .mime_str(document.mime_type())?;

        let form = Form::new()
            .part("pdf", file)
            .text("tables", config.extract_tables.to_string())
            .text("text", config.extract_text.to_string());

        let url = self.endpoint(config);
        debug!(%url, document = document.name(), "Sending extraction request");

        let response = self.client.post(&url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl ExtractionBackend for HttpBackend {
    async fn extract(
        &self,
        document: &Document,
        config: &ExtractionConfig,
        cancel: &CancelHandle,
    ) -> Result<ExtractionResult, ExtractionError> {
        cancel.run(self.send(document, config)).await
    }
}
