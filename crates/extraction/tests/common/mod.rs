//! Common test utilities and a scripted backend

#![allow(dead_code)]

use async_trait::async_trait;
use extraction::{
    CancelHandle, Document, ExtractionBackend, ExtractionConfig, ExtractionError,
    ExtractionResult, ExtractionSession, SessionSnapshot,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

type Outcome = Result<ExtractionResult, ExtractionError>;

/// A request captured by [`ScriptedBackend`], waiting for the test to answer.
pub struct Call {
    pub config: ExtractionConfig,
    pub document: String,
    pub cancel: CancelHandle,
    reply: oneshot::Sender<Outcome>,
}

impl Call {
    /// Answer the request. Answers to requests that were already abandoned
    /// are dropped, just like a late network response.
    pub fn resolve(self, outcome: Outcome) {
        let _ = self.reply.send(outcome);
    }
}

/// Backend whose every request stays pending until the test resolves it.
///
/// It deliberately ignores the cancel handle so that cancellation handling is
/// left entirely to the session.
pub struct ScriptedBackend {
    calls: mpsc::UnboundedSender<Call>,
}

impl ScriptedBackend {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Call>) {
        let (calls, rx) = mpsc::unbounded_channel();
        (Self { calls }, rx)
    }
}

#[async_trait]
impl ExtractionBackend for ScriptedBackend {
    async fn extract(
        &self,
        document: &Document,
        config: &ExtractionConfig,
        cancel: &CancelHandle,
    ) -> Result<ExtractionResult, ExtractionError> {
        let (reply, outcome) = oneshot::channel();
        self.calls
            .send(Call {
                config: *config,
                document: document.name().to_string(),
                cancel: cancel.clone(),
                reply,
            })
            .map_err(|_| ExtractionError::Backend("test harness dropped".to_string()))?;

        outcome
            .await
            .unwrap_or_else(|_| Err(ExtractionError::Backend("call dropped".to_string())))
    }
}

/// Backend that panics on every request.
pub struct PanickingBackend;

#[async_trait]
impl ExtractionBackend for PanickingBackend {
    async fn extract(
        &self,
        _document: &Document,
        _config: &ExtractionConfig,
        _cancel: &CancelHandle,
    ) -> Result<ExtractionResult, ExtractionError> {
        panic!("backend exploded");
    }
}

pub fn test_document() -> Document {
    Document::new("invoice.pdf", b"%PDF-1.7 test".to_vec())
}

pub fn scripted_session(capacity: usize) -> (ExtractionSession, mpsc::UnboundedReceiver<Call>) {
    let (backend, calls) = ScriptedBackend::new();
    let session = ExtractionSession::with_capacity(test_document(), Arc::new(backend), capacity);
    (session, calls)
}

/// Next captured request, failing the test instead of hanging.
pub async fn next_call(calls: &mut mpsc::UnboundedReceiver<Call>) -> Call {
    tokio::time::timeout(Duration::from_secs(5), calls.recv())
        .await
        .expect("timed out waiting for a backend call")
        .expect("backend dropped")
}

/// Wait until a published snapshot satisfies `predicate`.
pub async fn wait_for<F>(session: &ExtractionSession, predicate: F) -> SessionSnapshot
where
    F: FnMut(&SessionSnapshot) -> bool,
{
    let mut updates = session.subscribe();
    let snapshot = tokio::time::timeout(Duration::from_secs(5), updates.wait_for(predicate))
        .await
        .expect("timed out waiting for session state")
        .expect("session closed");
    snapshot.clone()
}

/// Let every runnable task make progress.
pub async fn drain_tasks() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
