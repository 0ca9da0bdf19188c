use thiserror::Error;

use crate::alert::error::AlertError;
use crate::common::error::DomainError;
use crate::record::error::StoreError;
use crate::task::error::QueueError;

/// Which outbound queue a publish targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueRole {
    Content,
    Attribute,
    Task,
}

impl QueueRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Attribute => "attribute",
            Self::Task => "task",
        }
    }
}

impl std::fmt::Display for QueueRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("invalid alert: {0}")]
    InvalidAlert(#[from] AlertError),

    #[error("failed to encode {what}: {reason}")]
    Encode { what: String, reason: String },

    #[error("failed to decode {what}: {reason}")]
    Decode { what: String, reason: String },

    #[error("corrupt {what} record: {reason} (data: {data})")]
    CorruptRecord {
        what: &'static str,
        reason: String,
        data: String,
    },

    #[error("store {op} failed ({context}): {source}")]
    Store {
        op: &'static str,
        context: String,
        source: StoreError,
    },

    #[error("publish to {role} queue '{queue}' failed: {source}")]
    Queue {
        role: QueueRole,
        queue: String,
        source: QueueError,
    },

    #[error("inspector failed: {0}")]
    Inspector(String),
}

impl From<ReportError> for DomainError {
    fn from(e: ReportError) -> Self {
        match e {
            ReportError::InvalidAlert(_) | ReportError::Decode { .. } => {
                DomainError::InvalidInput(e.to_string())
            }
            _ => DomainError::EngineError(e.to_string()),
        }
    }
}
