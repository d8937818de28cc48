//! Lifecycle errors.

use paycode_types::RuleId;
use thiserror::Error;

/// Errors surfaced by lifecycle operations.
///
/// Compile failures and repair outcomes are not errors here: they are
/// ordinary [`ActivationOutcome`](crate::ActivationOutcome) values,
/// because a rule that fails to compile is an expected result of
/// generating code from free text.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The text generation capability failed outright.
    #[error("text generation failed: {0}")]
    TextGeneration(String),

    /// The similarity capability failed.
    #[error("similarity search failed: {0}")]
    Similarity(String),

    /// No generation request exists under the given ID.
    #[error("generation request {0} not found")]
    RequestNotFound(RuleId),

    /// No pay rule exists under the given ID.
    #[error("pay rule {0} not found")]
    RuleNotFound(RuleId),

    /// The request is not in a status the operation accepts.
    #[error("request {id} has status {status}, expected {expected}")]
    InvalidStatus {
        id: RuleId,
        status: String,
        expected: String,
    },

    #[error(transparent)]
    Store(#[from] paycode_store::StoreError),

    #[error(transparent)]
    Registry(#[from] paycode_registry::RegistryError),
}

/// Result type for lifecycle operations.
pub type GenerationResult<T> = Result<T, GenerationError>;
