//! # Engine Error Type
//!
//! Unified error type returned by every engine operation.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Engine                             │
//! │                                                                         │
//! │  Service method  →  Result<T, EngineError>                             │
//! │         │                                                               │
//! │         ├── Business rule broken? ─── CoreError ──────┐                │
//! │         │                                             │                │
//! │         ├── Storage failed? ───────── DbError ────────┼──► EngineError │
//! │         │                                             │                │
//! │         └── Success ──────────────────────────────────┘                │
//! │                                                                         │
//! │  Callers branch on `kind()`:                                           │
//! │     VALIDATION | NOT_FOUND | CONFLICT | FORBIDDEN | PERSISTENCE         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any error returned before `commit` means the transaction was rolled back:
//! the order is still pending and no balance moved.

use canteen_core::{CoreError, ErrorKind, ValidationError};
use canteen_db::{DbError, SqlxError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Business rule or validation failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage unavailable or failing. Never masked, never retried.
    #[error("Persistence failure: {0}")]
    Persistence(#[from] DbError),
}

impl EngineError {
    /// Machine-readable category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Core(err) => err.kind(),
            EngineError::Persistence(_) => ErrorKind::Persistence,
        }
    }

    /// The core error, if this is one.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            EngineError::Core(err) => Some(err),
            EngineError::Persistence(_) => None,
        }
    }
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Core(CoreError::Validation(err))
    }
}

/// `tx.commit()` returns raw sqlx errors.
impl From<SqlxError> for EngineError {
    fn from(err: SqlxError) -> Self {
        EngineError::Persistence(DbError::from(err))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_passthrough() {
        let err: EngineError = CoreError::not_found("bill", "b1").into();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err: EngineError = DbError::PoolExhausted.into();
        assert_eq!(err.kind(), ErrorKind::Persistence);
    }

    #[test]
    fn test_transparent_message() {
        let err: EngineError = CoreError::ItemUnavailable("tea".to_string()).into();
        assert_eq!(err.to_string(), "Item tea is not available");
    }
}
