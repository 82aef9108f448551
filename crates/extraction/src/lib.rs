//! # Extraction
//!
//! Session manager for document extraction jobs.
//!
//! A session holds one uploaded document and any number of independently
//! configured extraction jobs against it, up to a fixed cap. Jobs run
//! concurrently, finish in any order, and can be deleted at any time; deleting
//! a pending job cancels its request and any late completion is discarded.
//!
//! ## Example
//!
//! ```rust,no_run
//! use extraction::{Document, ExtractionConfig, ExtractionSession, HttpBackend, Tool};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let document = Document::open(Path::new("invoice.pdf")).await?;
//! let backend = Arc::new(HttpBackend::new("http://localhost:8000/api/v1"));
//! let session = ExtractionSession::new(document, backend);
//!
//! let config = ExtractionConfig {
//!     tool: Tool::Docling,
//!     ..ExtractionConfig::default()
//! };
//! let id = session.submit(config).expect("session has room");
//!
//! let snapshot = session.settled().await;
//! if let Some(result) = snapshot.get(id).and_then(|job| job.result()) {
//!     println!("{} paragraphs", result.text.as_ref().map_or(0, Vec::len));
//! }
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod cancel;
pub mod config;
pub mod document;
pub mod error;
pub mod job;
pub mod runner;
pub mod session;
pub mod store;
pub mod types;
pub mod ui;

// Re-export main types
pub use backend::{ExtractionBackend, HttpBackend};
pub use cancel::CancelHandle;
pub use config::Settings;
pub use document::Document;
pub use error::{ConfigError, DocumentError, ExtractionError};
pub use job::{ExtractionJob, JobId, JobInfo, JobStatus};
pub use session::ExtractionSession;
pub use store::{SessionSnapshot, SessionStore};
pub use types::{ExtractionConfig, ExtractionResult, Table, Tables, Tool};
pub use ui::{FormState, UiState};

/// Default cap on jobs held by one session.
pub const MAX_EXTRACTIONS: usize = 5;
