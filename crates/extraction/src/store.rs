//! Session store: the ordered job list and the active selection.
//!
//! All mutations go through one mutex and swap in a new job list, so a
//! [`SessionSnapshot`] handed out earlier never changes underneath its
//! reader. Each mutation also publishes the new snapshot on a watch channel
//! once the mutex has been released.

use crate::cancel::CancelHandle;
use crate::error::ExtractionError;
use crate::job::{ExtractionJob, JobId, JobInfo};
use crate::types::{ExtractionConfig, ExtractionResult};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Immutable view of a session: jobs in submission order plus the active id.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    jobs: Arc<Vec<ExtractionJob>>,
    active_id: Option<JobId>,
    version: u64,
}

impl SessionSnapshot {
    pub fn jobs(&self) -> &[ExtractionJob] {
        &self.jobs
    }

    pub fn active_id(&self) -> Option<JobId> {
        self.active_id
    }

    pub fn active(&self) -> Option<&ExtractionJob> {
        self.active_id.and_then(|id| self.get(id))
    }

    pub fn get(&self, id: JobId) -> Option<&ExtractionJob> {
        self.jobs.iter().find(|job| job.id() == id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn ids(&self) -> Vec<JobId> {
        self.jobs.iter().map(ExtractionJob::id).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.jobs.iter().filter(|job| job.is_pending()).count()
    }

    pub fn has_pending(&self) -> bool {
        self.jobs.iter().any(ExtractionJob::is_pending)
    }

    pub fn infos(&self) -> Vec<JobInfo> {
        self.jobs.iter().map(ExtractionJob::info).collect()
    }

    fn position(&self, id: JobId) -> Option<usize> {
        self.jobs.iter().position(|job| job.id() == id)
    }

    /// Stamp the next version and return the copy to publish.
    fn commit(&mut self) -> SessionSnapshot {
        self.version += 1;
        self.clone()
    }
}

/// Owner of a session's jobs, capped at a fixed number of jobs.
pub struct SessionStore {
    state: Mutex<SessionSnapshot>,
    capacity: usize,
    root: CancelHandle,
    updates: watch::Sender<SessionSnapshot>,
}

impl SessionStore {
    pub fn new(capacity: usize) -> Self {
        let (updates, _) = watch::channel(SessionSnapshot::default());
        Self {
            state: Mutex::new(SessionSnapshot::default()),
            capacity,
            root: CancelHandle::new(),
            updates,
        }
    }

    /// Maximum number of jobs held at once.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.lock().clone()
    }

    /// Receiver that observes a fresh snapshot after every mutation.
    ///
    /// A `watch::Ref` borrowed from the receiver blocks publishing, so drop
    /// it before mutating the session from the same thread.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.updates.subscribe()
    }

    /// Whether another job would be admitted right now.
    pub fn can_submit(&self) -> bool {
        self.state.lock().len() < self.capacity
    }

    /// Append a pending job for `config` and make it active.
    ///
    /// Returns `None` without touching the session when it is full.
    pub fn admit(&self, config: ExtractionConfig) -> Option<(JobId, CancelHandle)> {
        let mut state = self.state.lock();
        if state.len() >= self.capacity {
            debug!(capacity = self.capacity, "Session full, submission ignored");
            return None;
        }

        let id = JobId::new();
        let cancel = self.root.child();
        Arc::make_mut(&mut state.jobs).push(ExtractionJob::pending(id, config, cancel.clone()));
        state.active_id = Some(id);
        let snapshot = state.commit();
        drop(state);
        self.publish(snapshot);

        info!(job_id = %id, tool = %config.tool, "Extraction job admitted");
        Some((id, cancel))
    }

    /// Record the outcome of a job's request.
    ///
    /// Only a job that still exists and is still pending is updated.
    /// Cancellations and completions for deleted jobs are dropped.
    pub fn complete(&self, id: JobId, outcome: Result<ExtractionResult, ExtractionError>) -> bool {
        if matches!(&outcome, Err(err) if err.is_cancelled()) {
            debug!(job_id = %id, "Cancelled request discarded");
            return false;
        }

        let mut state = self.state.lock();
        let Some(index) = state.position(id) else {
            debug!(job_id = %id, "Completion for removed job ignored");
            return false;
        };
        if !state.jobs[index].is_pending() {
            return false;
        }

        let job = &mut Arc::make_mut(&mut state.jobs)[index];
        if !job.settle(outcome) {
            return false;
        }
        match job.error_message() {
            Some(message) => warn!(job_id = %id, error = message, "Extraction failed"),
            None => info!(job_id = %id, "Extraction succeeded"),
        }
        let snapshot = state.commit();
        drop(state);
        self.publish(snapshot);
        true
    }

    /// Delete a job, cancelling its request first if it is still pending.
    ///
    /// Deleting the active job activates the first remaining one.
    pub fn remove(&self, id: JobId) -> bool {
        let mut state = self.state.lock();
        let Some(index) = state.position(id) else {
            return false;
        };

        if let Some(cancel) = state.jobs[index].cancel_handle() {
            cancel.cancel();
            debug!(job_id = %id, "In-flight request cancelled");
        }
        Arc::make_mut(&mut state.jobs).remove(index);

        if state.active_id == Some(id) {
            state.active_id = state.jobs.first().map(ExtractionJob::id);
        }
        let snapshot = state.commit();
        drop(state);
        self.publish(snapshot);

        info!(job_id = %id, "Extraction job removed");
        true
    }

    /// Select a job for display. Unknown ids are ignored.
    pub fn set_active(&self, id: JobId) -> bool {
        let mut state = self.state.lock();
        if state.position(id).is_none() {
            return false;
        }
        if state.active_id != Some(id) {
            state.active_id = Some(id);
            let snapshot = state.commit();
            drop(state);
            self.publish(snapshot);
        }
        true
    }

    pub fn get(&self, id: JobId) -> Option<ExtractionJob> {
        self.state.lock().get(id).cloned()
    }

    /// Cancel every pending job and empty the session.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        let cancelled = state
            .jobs
            .iter()
            .filter_map(ExtractionJob::cancel_handle)
            .inspect(|cancel| cancel.cancel())
            .count();

        let version = state.version;
        *state = SessionSnapshot {
            version,
            ..SessionSnapshot::default()
        };
        let snapshot = state.commit();
        drop(state);
        self.publish(snapshot);
        info!(cancelled, "Session reset");
    }

    // Publishing races between threads; a stale snapshot never replaces a newer one.
    fn publish(&self, snapshot: SessionSnapshot) {
        self.updates.send_if_modified(|current| {
            if snapshot.version <= current.version {
                return false;
            }
            *current = snapshot;
            true
        });
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobStatus;
    use crate::types::{Table, Tables, Tool};
    use std::collections::HashSet;

    fn config(tool: Tool) -> ExtractionConfig {
        ExtractionConfig {
            tool,
            ..ExtractionConfig::default()
        }
    }

    fn admit(store: &SessionStore) -> JobId {
        store.admit(ExtractionConfig::default()).unwrap().0
    }

    fn table_result() -> ExtractionResult {
        let mut tables = Tables::new();
        tables.insert(
            "t1".to_string(),
            Table {
                headers: vec!["a".into()],
                values: vec![vec!["1".into()]],
            },
        );
        ExtractionResult {
            text: None,
            tables: Some(tables),
        }
    }

    #[test]
    fn test_admission_stops_at_capacity() {
        let store = SessionStore::new(5);
        for _ in 0..5 {
            assert!(store.can_submit());
            assert!(store.admit(ExtractionConfig::default()).is_some());
        }

        let before = store.snapshot();
        assert!(!store.can_submit());
        assert!(store.admit(ExtractionConfig::default()).is_none());

        let after = store.snapshot();
        assert_eq!(after.len(), 5);
        assert_eq!(after.ids(), before.ids());
        assert_eq!(after.active_id(), before.active_id());
    }

    #[test]
    fn test_admit_appends_and_activates() {
        let store = SessionStore::new(5);
        let a = store.admit(config(Tool::Spacy)).unwrap().0;
        let b = store.admit(config(Tool::Docling)).unwrap().0;

        let snapshot = store.snapshot();
        assert_eq!(snapshot.ids(), vec![a, b]);
        assert_eq!(snapshot.active_id(), Some(b));
        assert_eq!(snapshot.active().unwrap().tool(), Tool::Docling);
        assert_eq!(snapshot.pending_count(), 2);
    }

    #[test]
    fn test_insertion_order_survives_completion_order() {
        let store = SessionStore::new(5);
        let a = admit(&store);
        let b = admit(&store);

        assert!(store.complete(b, Ok(ExtractionResult::default())));
        assert!(store.complete(a, Err(ExtractionError::Backend("boom".into()))));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.ids(), vec![a, b]);
        assert_eq!(snapshot.get(a).unwrap().status(), JobStatus::Error);
        assert_eq!(snapshot.get(b).unwrap().status(), JobStatus::Success);
    }

    #[test]
    fn test_success_payload_stored_verbatim() {
        let store = SessionStore::new(5);
        let id = store
            .admit(ExtractionConfig {
                tool: Tool::Spacy,
                process_output: true,
                extract_tables: true,
                extract_text: false,
            })
            .unwrap()
            .0;

        assert!(store.complete(id, Ok(table_result())));

        let job = store.get(id).unwrap();
        assert_eq!(job.status(), JobStatus::Success);
        assert_eq!(job.result(), Some(&table_result()));
        assert!(job.error_message().is_none());
        assert!(!job.config().extract_text);
    }

    #[test]
    fn test_failure_leaves_other_jobs_pending() {
        let store = SessionStore::new(5);
        let a = admit(&store);
        let b = admit(&store);

        store.complete(a, Err(ExtractionError::Backend("timeout".into())));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.get(a).unwrap().error_message(), Some("timeout"));
        assert_eq!(snapshot.get(b).unwrap().status(), JobStatus::Pending);
    }

    #[test]
    fn test_remove_pending_cancels_before_removal() {
        let store = SessionStore::new(5);
        let (id, cancel) = store.admit(ExtractionConfig::default()).unwrap();
        let mut updates = store.subscribe();

        assert!(store.remove(id));
        assert!(cancel.is_cancelled());
        assert!(store.get(id).is_none());
        assert!(updates.has_changed().unwrap());
        assert!(updates.borrow_and_update().is_empty());
    }

    #[test]
    fn test_late_completion_after_remove_is_noop() {
        let store = SessionStore::new(5);
        let keep = admit(&store);
        let gone = admit(&store);
        store.remove(gone);

        let before = store.snapshot();
        let mut updates = store.subscribe();

        assert!(!store.complete(gone, Ok(table_result())));
        assert!(!store.complete(gone, Err(ExtractionError::Status(500))));

        let after = store.snapshot();
        assert_eq!(after.ids(), vec![keep]);
        assert_eq!(after.ids(), before.ids());
        assert!(!updates.has_changed().unwrap());
    }

    #[test]
    fn test_cancelled_outcome_never_recorded() {
        let store = SessionStore::new(5);
        let id = admit(&store);
        assert!(!store.complete(id, Err(ExtractionError::Cancelled)));
        assert_eq!(store.get(id).unwrap().status(), JobStatus::Pending);
    }

    #[test]
    fn test_second_completion_is_ignored() {
        let store = SessionStore::new(5);
        let id = admit(&store);
        assert!(store.complete(id, Ok(table_result())));
        assert!(!store.complete(id, Err(ExtractionError::Backend("late".into()))));
        assert_eq!(store.get(id).unwrap().result(), Some(&table_result()));
    }

    #[test]
    fn test_remove_terminal_job() {
        let store = SessionStore::new(5);
        let (id, cancel) = store.admit(ExtractionConfig::default()).unwrap();
        store.complete(id, Ok(ExtractionResult::default()));

        assert!(store.remove(id));
        assert!(!cancel.is_cancelled());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_remove_active_selects_first_remaining() {
        let store = SessionStore::new(5);
        let x = admit(&store);
        let y = admit(&store);
        let z = admit(&store);
        assert!(store.set_active(x));

        store.remove(x);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.active_id(), Some(y));
        assert_eq!(snapshot.ids(), vec![y, z]);
    }

    #[test]
    fn test_remove_inactive_keeps_selection() {
        let store = SessionStore::new(5);
        let x = admit(&store);
        let y = admit(&store);

        store.remove(x);
        assert_eq!(store.snapshot().active_id(), Some(y));
    }

    #[test]
    fn test_remove_last_job_clears_selection() {
        let store = SessionStore::new(5);
        let id = admit(&store);
        store.remove(id);
        assert_eq!(store.snapshot().active_id(), None);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let store = SessionStore::new(5);
        let id = admit(&store);
        store.remove(id);

        let mut updates = store.subscribe();
        assert!(!store.remove(id));
        assert!(!updates.has_changed().unwrap());
    }

    #[test]
    fn test_set_active_ignores_unknown_ids() {
        let store = SessionStore::new(5);
        let a = admit(&store);
        let b = admit(&store);
        store.remove(b);

        assert!(!store.set_active(b));
        assert_eq!(store.snapshot().active_id(), Some(a));
    }

    #[test]
    fn test_ids_never_reused() {
        let store = SessionStore::new(2);
        let mut seen = HashSet::new();

        for _ in 0..50 {
            let id = admit(&store);
            assert!(seen.insert(id));
            store.remove(id);
        }
        store.reset();
        assert!(seen.insert(admit(&store)));
    }

    #[test]
    fn test_snapshots_are_isolated_from_later_mutations() {
        let store = SessionStore::new(5);
        let id = admit(&store);
        let held = store.snapshot();

        store.complete(id, Ok(ExtractionResult::default()));
        admit(&store);

        assert_eq!(held.len(), 1);
        assert!(held.get(id).unwrap().is_pending());
        assert_eq!(store.snapshot().len(), 2);
    }

    #[test]
    fn test_reset_cancels_pending_jobs() {
        let store = SessionStore::new(5);
        let (done, done_cancel) = store.admit(ExtractionConfig::default()).unwrap();
        let (_, pending_cancel) = store.admit(ExtractionConfig::default()).unwrap();
        store.complete(done, Ok(ExtractionResult::default()));

        store.reset();
        assert!(pending_cancel.is_cancelled());
        assert!(!done_cancel.is_cancelled());
        assert!(store.snapshot().is_empty());
        assert!(store.can_submit());
    }

    #[test]
    fn test_drop_cancels_in_flight_requests() {
        let store = SessionStore::new(5);
        let (_, cancel) = store.admit(ExtractionConfig::default()).unwrap();
        drop(store);
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn test_subscriber_sees_latest_snapshot() {
        let store = SessionStore::new(5);
        let mut updates = store.subscribe();

        let first = admit(&store);
        let second = admit(&store);
        store.complete(second, Ok(ExtractionResult::default()));
        store.remove(first);

        assert!(updates.has_changed().unwrap());
        let seen = updates.borrow_and_update();
        assert_eq!(seen.ids(), vec![second]);
        assert_eq!(seen.active_id(), Some(second));
        assert!(!seen.has_pending());
    }

    #[test]
    fn test_held_borrow_does_not_block_store_queries() {
        let store = Arc::new(SessionStore::new(5));
        let updates = store.subscribe();
        let held = updates.borrow();

        let writer = Arc::clone(&store);
        let handle = std::thread::spawn(move || {
            writer.admit(ExtractionConfig::default());
        });
        std::thread::sleep(std::time::Duration::from_millis(50));

        // The writer waits on the watch channel, not on the store mutex.
        assert!(store.can_submit());
        let _ = store.snapshot();

        drop(held);
        handle.join().unwrap();
        assert_eq!(store.snapshot().len(), 1);
        assert_eq!(updates.borrow().len(), 1);
    }
}
