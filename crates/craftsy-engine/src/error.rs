use thiserror::Error;

use crate::model::SchemaError;

/// Errors raised while resolving positions or applying edits.
///
/// Every variant is recoverable: the attempted edit is discarded and the
/// previous revision stays authoritative.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("position {pos} is outside the document (size {size})")]
    OutOfRange { pos: usize, size: usize },

    #[error("schema violation: {0}")]
    SchemaViolation(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl From<SchemaError> for EditError {
    fn from(err: SchemaError) -> Self {
        EditError::SchemaViolation(err.to_string())
    }
}
