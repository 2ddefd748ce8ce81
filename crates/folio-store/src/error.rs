//! Store error types.

use folio_types::{BlockError, BlockId};
use thiserror::Error;

/// The four ways a store call can fail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Network or server failure; the request may or may not have landed.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Caller supplied invalid input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The referenced block no longer exists.
    #[error("block not found: {0}")]
    NotFound(BlockId),

    /// Update requested with no fields.
    #[error("no fields to update")]
    NoOp,
}

impl StoreError {
    /// Stable machine-readable code, used on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Unavailable(_) => "unavailable",
            StoreError::Validation(_) => "validation",
            StoreError::NotFound(_) => "not_found",
            StoreError::NoOp => "no_op",
        }
    }

    /// Rebuild an error from its wire code.
    ///
    /// `id` is the block the request targeted, needed for `not_found`.
    /// Unknown codes are treated as the server being unwell.
    pub fn from_code(code: &str, message: impl Into<String>, id: Option<BlockId>) -> Self {
        match (code, id) {
            ("validation", _) => StoreError::Validation(message.into()),
            ("no_op", _) => StoreError::NoOp,
            ("not_found", Some(id)) => StoreError::NotFound(id),
            _ => StoreError::Unavailable(message.into()),
        }
    }
}

impl From<BlockError> for StoreError {
    fn from(err: BlockError) -> Self {
        match err {
            BlockError::EmptyPatch => StoreError::NoOp,
            other => StoreError::Validation(other.to_string()),
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Unavailable(format!("database error: {err}"))
    }
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
