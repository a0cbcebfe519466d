//! Errors - エラー型と分類
//!
//! - `InvalidInput`: malformed producer request
//! - `NotFound`: status lookup for an unknown id
//! - `StoreUnavailable`: queue store failure, never handled by the delivery loop itself
//! - `CorruptRecord`: stored data that no longer parses (server-side fault)
//! - `WorkerStopped`: a delivery worker ended without being asked to
//! - `ProcessingFailure`: always absorbed by the worker and turned into a routing decision

use thiserror::Error;

use crate::ports::StoreError;

#[derive(Debug, Error)]
pub enum FerryError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("message not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),

    #[error("envelope codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("corrupt record {key}: {detail}")]
    CorruptRecord { key: String, detail: String },

    #[error("delivery worker stopped: {0}")]
    WorkerStopped(String),
}

/// Failure signalled by a [`MessageProcessor`](crate::ports::MessageProcessor).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("processing failed: {reason}")]
pub struct ProcessingFailure {
    pub reason: String,
}

impl ProcessingFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
