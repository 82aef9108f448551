//! The uploaded document shared by every job of a session.

use crate::error::DocumentError;
use std::path::Path;
use std::sync::Arc;

/// An in-memory document. Cloning is cheap; the bytes are shared.
#[derive(Debug, Clone)]
pub struct Document {
    name: String,
    mime_type: String,
    bytes: Arc<[u8]>,
}

impl Document {
    /// Wrap bytes that were already read, guessing the MIME type from `name`.
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let name = name.into();
        let mime_type = mime_guess::from_path(&name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Self {
            name,
            mime_type,
            bytes: bytes.into(),
        }
    }

    /// Read a document from disk.
    pub async fn open(path: &Path) -> Result<Self, DocumentError> {
        if !path.exists() {
            return Err(DocumentError::NotFound(path.to_path_buf()));
        }

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| DocumentError::InvalidPath(path.to_path_buf()))?;

        let bytes = tokio::fs::read(path).await?;
        Ok(Self::new(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Size in megabytes with two decimals, e.g. "1.25 MB".
    pub fn display_size(&self) -> String {
        format!("{:.2} MB", self.size_bytes() as f64 / 1024.0 / 1024.0)
    }
}
