//! Extraction session: the inbound operations used by the presentation layer.

use crate::backend::ExtractionBackend;
use crate::document::Document;
use crate::job::{ExtractionJob, JobId};
use crate::runner::JobRunner;
use crate::store::{SessionSnapshot, SessionStore};
use crate::types::ExtractionConfig;
use crate::MAX_EXTRACTIONS;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::warn;

/// All extraction jobs launched against one uploaded document.
///
/// Dropping the session cancels every request still in flight.
pub struct ExtractionSession {
    document: Document,
    store: Arc<SessionStore>,
    runner: JobRunner,
}

impl ExtractionSession {
    /// Create a session capped at [`MAX_EXTRACTIONS`] jobs.
    pub fn new(document: Document, backend: Arc<dyn ExtractionBackend>) -> Self {
        Self::with_capacity(document, backend, MAX_EXTRACTIONS)
    }

    pub fn with_capacity(
        document: Document,
        backend: Arc<dyn ExtractionBackend>,
        capacity: usize,
    ) -> Self {
        let store = Arc::new(SessionStore::new(capacity));
        let runner = JobRunner::new(backend, document.clone(), &store);
        Self {
            document,
            store,
            runner,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    /// Whether [`ExtractionSession::submit`] would admit a job.
    pub fn can_submit(&self) -> bool {
        self.store.can_submit()
    }

    /// Launch a job with a copy of `config`.
    ///
    /// Returns `None`, with no state change, when the session is full or
    /// when called outside a tokio runtime.
    pub fn submit(&self, config: ExtractionConfig) -> Option<JobId> {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(err) => {
                warn!(error = %err, "Submission ignored outside a tokio runtime");
                return None;
            }
        };
        let (id, cancel) = self.store.admit(config)?;
        self.runner.spawn(&runtime, id, config, cancel);
        Some(id)
    }

    /// Delete a job, aborting its request if it is still pending.
    pub fn delete(&self, id: JobId) -> bool {
        self.store.remove(id)
    }

    pub fn set_active(&self, id: JobId) -> bool {
        self.store.set_active(id)
    }

    pub fn get_by_id(&self, id: JobId) -> Option<ExtractionJob> {
        self.store.get(id)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.store.subscribe()
    }

    /// Discard every job, cancelling those still pending.
    pub fn reset(&self) {
        self.store.reset();
    }

    /// Wait until no job is pending and return that snapshot.
    pub async fn settled(&self) -> SessionSnapshot {
        let mut updates = self.subscribe();
        let settled = match updates.wait_for(|snapshot| !snapshot.has_pending()).await {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => self.snapshot(),
        };
        settled
    }
}
