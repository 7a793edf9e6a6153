use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result of attempting a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
}

/// One append-only entry in the processing history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub document_id: String,
    pub processed_timestamp: DateTime<Utc>,
    pub outcome: Outcome,
    /// Batch run that produced this entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
    /// Number of records written (success only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utterances: Option<usize>,
    /// Failure description (failure only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HistoryEntry {
    pub fn success(document_id: impl Into<String>, utterances: usize) -> Self {
        Self {
            document_id: document_id.into(),
            processed_timestamp: Utc::now(),
            outcome: Outcome::Success,
            run_id: None,
            utterances: Some(utterances),
            error: None,
        }
    }

    pub fn failure(document_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            processed_timestamp: Utc::now(),
            outcome: Outcome::Failure,
            run_id: None,
            utterances: None,
            error: Some(error.into()),
        }
    }

    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = Some(run_id);
        self
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

/// Aggregate counts over the history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HistoryStats {
    pub successes: usize,
    pub failures: usize,
    pub documents: usize,
}
