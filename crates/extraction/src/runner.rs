//! Job runner: one asynchronous extraction request per admitted job.

use crate::backend::ExtractionBackend;
use crate::cancel::CancelHandle;
use crate::document::Document;
use crate::error::ExtractionError;
use crate::job::JobId;
use crate::store::SessionStore;
use crate::types::ExtractionConfig;
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, Instrument};

/// Issues extraction requests and writes their outcome back to the store.
///
/// The runner holds the store weakly: a session that has been dropped simply
/// receives nothing.
#[derive(Clone)]
pub struct JobRunner {
    backend: Arc<dyn ExtractionBackend>,
    document: Document,
    store: Weak<SessionStore>,
}

impl JobRunner {
    pub fn new(
        backend: Arc<dyn ExtractionBackend>,
        document: Document,
        store: &Arc<SessionStore>,
    ) -> Self {
        Self {
            backend,
            document,
            store: Arc::downgrade(store),
        }
    }

    /// Run the request for job `id` to completion or cancellation.
    ///
    /// Only a fired cancel signal ends a job silently. Any other outcome,
    /// including a panicking backend, settles the job.
    pub async fn run(&self, id: JobId, config: ExtractionConfig, cancel: CancelHandle) {
        let backend = Arc::clone(&self.backend);
        let document = self.document.clone();
        let request_cancel = cancel.clone();
        let request = tokio::spawn(
            async move {
                request_cancel
                    .run(backend.extract(&document, &config, &request_cancel))
                    .await
            }
            .in_current_span(),
        );

        let outcome = match request.await {
            Ok(outcome) => outcome,
            Err(err) if err.is_panic() => {
                error!(job_id = %id, "Extraction backend panicked");
                Err(ExtractionError::Backend("Extraction request panicked".to_string()))
            }
            Err(err) => Err(ExtractionError::Backend(format!(
                "Extraction request aborted: {err}"
            ))),
        };

        if cancel.is_cancelled() {
            debug!(job_id = %id, "Extraction request cancelled");
            return;
        }
        let outcome = match outcome {
            Err(err) if err.is_cancelled() => Err(ExtractionError::Backend(
                "Extraction request was interrupted".to_string(),
            )),
            outcome => outcome,
        };

        match self.store.upgrade() {
            Some(store) => {
                store.complete(id, outcome);
            }
            None => debug!(job_id = %id, "Session closed before completion"),
        }
    }

    /// Spawn [`JobRunner::run`] on `runtime`.
    pub fn spawn(
        &self,
        runtime: &Handle,
        id: JobId,
        config: ExtractionConfig,
        cancel: CancelHandle,
    ) -> JoinHandle<()> {
        let runner = self.clone();
        let span = tracing::info_span!("extraction", job_id = %id, tool = %config.tool);
        runtime.spawn(async move { runner.run(id, config, cancel).await }.instrument(span))
    }
}
