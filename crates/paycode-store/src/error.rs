//! Store errors.

use paycode_types::RuleId;
use thiserror::Error;

/// Errors surfaced by repository operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No pay rule exists under the given ID.
    #[error("pay rule {0} not found")]
    RuleNotFound(RuleId),

    /// No generation request exists under the given ID.
    #[error("generation request {0} not found")]
    RequestNotFound(RuleId),

    /// Backend-specific failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
