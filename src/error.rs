use std::path::PathBuf;

use thiserror::Error;

use crate::models::DocumentStatus;

/// Document-level structural failures raised by the parser core
#[derive(Debug, Error)]
pub enum ParseError {
    /// Page numbers skip, repeat, or do not start at 1
    #[error("extraction gap in {document_id}: expected page {expected}, found page {found}")]
    ExtractionGap {
        document_id: String,
        expected: u32,
        found: u32,
    },

    /// Non-empty input produced no utterances, or there was nothing to parse
    #[error("document {document_id} produced no utterances")]
    EmptyDocument { document_id: String },

    #[error("document {document_id} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        document_id: String,
        from: DocumentStatus,
        to: DocumentStatus,
    },
}

/// Failures writing the output stream
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The id cannot be used as an output file name as is
    #[error("document id {0:?} is not a valid file name")]
    InvalidDocumentId(String),
}

/// Failures reading or updating the processing history
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize history: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to save history: {0}")]
    Save(#[from] EmitError),

    /// A success entry already exists for this document
    #[error("document {0} is already recorded as processed")]
    AlreadyProcessed(String),
}

/// Invalid weekly schedule settings
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid weekday: {0:?}")]
    InvalidDay(String),

    #[error("invalid time {value:?} (expected HH:MM): {source}")]
    InvalidTime {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Any failure while processing one document
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error(transparent)]
    History(#[from] HistoryError),
}
