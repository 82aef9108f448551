//! Error types for extraction sessions.

use std::path::PathBuf;
use thiserror::Error;

/// Outcome of a failed extraction request.
///
/// `Cancelled` is the expected result of deleting a pending job and is never
/// recorded on a job. Every other variant becomes that job's error message.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The request was aborted through its cancel handle.
    #[error("Cancelled by user")]
    Cancelled,

    /// The request could not be sent or the connection failed.
    #[error("Request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success status code.
    #[error("Failed to extract data (HTTP {0})")]
    Status(u16),

    /// The response body is not a valid extraction payload.
    #[error("Invalid extraction payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// Failure reported by a backend implementation, message kept verbatim.
    #[error("{0}")]
    Backend(String),
}

impl ExtractionError {
    /// Whether this failure was caused by the cancellation signal itself.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExtractionError::Cancelled)
    }
}

impl From<reqwest::Error> for ExtractionError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ExtractionError::Status(status.as_u16()),
            None => ExtractionError::Request(err.to_string()),
        }
    }
}

/// Errors raised while reading the uploaded document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Document file not found at the specified path.
    #[error("Document not found: {0}")]
    NotFound(PathBuf),

    /// The path has no usable file name.
    #[error("Invalid document path: {0}")]
    InvalidPath(PathBuf),

    /// An I/O error occurred while reading the document.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading or saving settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No platform configuration directory could be determined.
    #[error("Failed to get config directory")]
    NoConfigDir,

    /// Settings could not be serialized.
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Reading or writing the settings file failed.
    #[error("Settings file error: {0}")]
    Io(#[from] std::io::Error),
}
