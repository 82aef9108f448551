//! Extraction job records and their lifecycle.

use crate::cancel::CancelHandle;
use crate::error::ExtractionError;
use crate::types::{ExtractionConfig, ExtractionResult, Tool};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque identifier of a job, unique for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First three characters, used to tell tabs of the same tool apart.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..3].to_string()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Coarse lifecycle state, as shown to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Success,
    Error,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JobStatus::Pending => "Pending",
            JobStatus::Success => "Success",
            JobStatus::Error => "Error",
        })
    }
}

/// Lifecycle state together with the data that belongs to it.
#[derive(Debug, Clone)]
enum JobState {
    Pending(CancelHandle),
    Success(ExtractionResult),
    Error(String),
}

/// One user-initiated extraction attempt.
#[derive(Debug, Clone)]
pub struct ExtractionJob {
    id: JobId,
    config: ExtractionConfig,
    created_at: DateTime<Utc>,
    state: JobState,
}

impl ExtractionJob {
    pub(crate) fn pending(id: JobId, config: ExtractionConfig, cancel: CancelHandle) -> Self {
        Self {
            id,
            config,
            created_at: Utc::now(),
            state: JobState::Pending(cancel),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn tool(&self) -> Tool {
        self.config.tool
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn status(&self) -> JobStatus {
        match self.state {
            JobState::Pending(_) => JobStatus::Pending,
            JobState::Success(_) => JobStatus::Success,
            JobState::Error(_) => JobStatus::Error,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, JobState::Pending(_))
    }

    /// Decoded payload, present only on success.
    pub fn result(&self) -> Option<&ExtractionResult> {
        match &self.state {
            JobState::Success(result) => Some(result),
            _ => None,
        }
    }

    /// Failure message, present only on error.
    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            JobState::Error(message) => Some(message),
            _ => None,
        }
    }

    pub(crate) fn cancel_handle(&self) -> Option<&CancelHandle> {
        match &self.state {
            JobState::Pending(cancel) => Some(cancel),
            _ => None,
        }
    }

    /// Tab caption: the tool while pending, tool plus short id afterwards.
    pub fn label(&self) -> String {
        if self.is_pending() {
            self.tool().label().to_string()
        } else {
            format!("{} #{}", self.tool().label(), self.id.short())
        }
    }

    /// Move a pending job to its terminal state. Returns false, leaving the
    /// job untouched, if it already settled or the outcome is a cancellation.
    pub(crate) fn settle(&mut self, outcome: Result<ExtractionResult, ExtractionError>) -> bool {
        if !self.is_pending() {
            return false;
        }

        self.state = match outcome {
            Ok(result) => JobState::Success(result),
            Err(err) if err.is_cancelled() => return false,
            Err(err) => JobState::Error(err.to_string()),
        };
        true
    }

    /// Serializable view for info panels and JSON output.
    pub fn info(&self) -> JobInfo {
        JobInfo {
            id: self.id,
            status: self.status(),
            config: self.config,
            created_at: self.created_at,
            result: self.result().cloned(),
            error_message: self.error_message().map(str::to_string),
        }
    }
}

/// Read-only description of a job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    pub id: JobId,
    pub status: JobStatus,
    pub config: ExtractionConfig,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ExtractionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}
