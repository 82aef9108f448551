//! Cooperative cancellation for in-flight extraction requests.

use crate::error::ExtractionError;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Handle used to abort a pending job's request.
///
/// Clones share the same signal. Cancelling is idempotent, and a handle
/// derived with [`CancelHandle::child`] is cancelled together with its parent.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle that fires when either it or `self` is cancelled.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }

    /// Request cancellation. Safe to call any number of times.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once cancellation has been requested.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Drive `fut` unless cancellation wins, in which case the future is
    /// dropped and [`ExtractionError::Cancelled`] is returned.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, ExtractionError>
    where
        F: Future<Output = Result<T, ExtractionError>>,
    {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(ExtractionError::Cancelled),
            result = fut => result,
        }
    }
}
