//! Presentation state around a session: the extraction form and view toggles.
//!
//! Nothing here affects running jobs; a submitted job only ever sees the
//! [`ExtractionConfig`] copied out of the form at submission time.

use crate::job::{JobId, JobInfo};
use crate::session::ExtractionSession;
use crate::store::SessionSnapshot;
use crate::types::{ExtractionConfig, Tool};

/// Editable extraction options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    config: ExtractionConfig,
}

impl FormState {
    pub fn new(defaults: ExtractionConfig) -> Self {
        Self { config: defaults }
    }

    pub fn tool(&self) -> Tool {
        self.config.tool
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.config.tool = tool;
    }

    pub fn set_process_output(&mut self, enabled: bool) {
        self.config.process_output = enabled;
    }

    pub fn set_extract_tables(&mut self, enabled: bool) {
        self.config.extract_tables = enabled;
    }

    pub fn set_extract_text(&mut self, enabled: bool) {
        self.config.extract_text = enabled;
    }

    /// Copy of the current options, as handed to a new job.
    pub fn snapshot(&self) -> ExtractionConfig {
        self.config
    }
}

/// Everything the results screen keeps besides the session itself.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    pub form: FormState,
    info_target: Option<JobId>,
    show_raw: bool,
    expanded: bool,
}

impl UiState {
    pub fn new(defaults: ExtractionConfig) -> Self {
        Self {
            form: FormState::new(defaults),
            ..Self::default()
        }
    }

    /// Submit the form's current options.
    pub fn submit(&self, session: &ExtractionSession) -> Option<JobId> {
        session.submit(self.form.snapshot())
    }

    /// Caption of the submit button.
    pub fn submit_label(&self, snapshot: &SessionSnapshot, capacity: usize) -> String {
        if snapshot.len() >= capacity {
            format!("Maximum {capacity} extractions reached")
        } else {
            "Run Extraction".to_string()
        }
    }

    /// Open the info view for `id`. Unknown ids leave the view unchanged.
    pub fn open_info(&mut self, session: &ExtractionSession, id: JobId) -> Option<JobInfo> {
        let info = session.get_by_id(id)?.info();
        self.info_target = Some(id);
        Some(info)
    }

    /// Info of the job being inspected; closes the view if it was deleted.
    pub fn info(&mut self, session: &ExtractionSession) -> Option<JobInfo> {
        let id = self.info_target?;
        let info = session.get_by_id(id).map(|job| job.info());
        if info.is_none() {
            self.info_target = None;
        }
        info
    }

    pub fn close_info(&mut self) {
        self.info_target = None;
    }

    pub fn is_info_open(&self) -> bool {
        self.info_target.is_some()
    }

    pub fn show_raw(&self) -> bool {
        self.show_raw
    }

    pub fn set_show_raw(&mut self, show_raw: bool) {
        self.show_raw = show_raw;
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn toggle_expanded(&mut self) {
        self.expanded = !self.expanded;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ExtractionBackend;
    use crate::cancel::CancelHandle;
    use crate::document::Document;
    use crate::error::ExtractionError;
    use crate::types::ExtractionResult;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct NeverBackend;

    #[async_trait]
    impl ExtractionBackend for NeverBackend {
        async fn extract(
            &self,
            _document: &Document,
            _config: &ExtractionConfig,
            cancel: &CancelHandle,
        ) -> Result<ExtractionResult, ExtractionError> {
            cancel.cancelled().await;
            Err(ExtractionError::Cancelled)
        }
    }

    fn session(capacity: usize) -> ExtractionSession {
        ExtractionSession::with_capacity(
            Document::new("doc.pdf", b"%PDF".to_vec()),
            Arc::new(NeverBackend),
            capacity,
        )
    }

    #[tokio::test]
    async fn test_form_edits_do_not_reach_submitted_jobs() {
        let session = session(5);
        let mut ui = UiState::new(ExtractionConfig::default());

        ui.form.set_tool(Tool::Docling);
        ui.form.set_extract_text(false);
        let id = ui.submit(&session).unwrap();

        ui.form.set_tool(Tool::Plumber);
        ui.form.set_extract_text(true);

        let job = session.get_by_id(id).unwrap();
        assert_eq!(job.tool(), Tool::Docling);
        assert!(!job.config().extract_text);
        assert_eq!(ui.form.tool(), Tool::Plumber);
    }

    #[tokio::test]
    async fn test_submit_label_tracks_capacity() {
        let session = session(1);
        let ui = UiState::default();
        assert_eq!(ui.submit_label(&session.snapshot(), 1), "Run Extraction");

        ui.submit(&session).unwrap();
        assert!(ui.submit(&session).is_none());
        assert_eq!(
            ui.submit_label(&session.snapshot(), session.capacity()),
            "Maximum 1 extractions reached"
        );
    }

    #[tokio::test]
    async fn test_info_view_follows_job_lifetime() {
        let session = session(5);
        let mut ui = UiState::default();
        let id = ui.submit(&session).unwrap();

        let info = ui.open_info(&session, id).unwrap();
        assert_eq!(info.id, id);
        assert!(ui.is_info_open());

        session.delete(id);
        assert!(ui.info(&session).is_none());
        assert!(!ui.is_info_open());
    }

    #[tokio::test]
    async fn test_open_info_for_unknown_job_is_noop() {
        let session = session(5);
        let mut ui = UiState::default();
        let id = ui.submit(&session).unwrap();
        session.delete(id);

        assert!(ui.open_info(&session, id).is_none());
        assert!(!ui.is_info_open());
    }

    #[test]
    fn test_view_toggles() {
        let mut ui = UiState::default();
        assert!(!ui.show_raw() && !ui.is_expanded());

        ui.set_show_raw(true);
        ui.toggle_expanded();
        assert!(ui.show_raw() && ui.is_expanded());

        ui.toggle_expanded();
        assert!(!ui.is_expanded());
    }
}
