//! Classification errors.

use thiserror::Error;

/// Errors surfaced by classification operations.
///
/// Individual rule runtime faults are not errors at this level; the
/// classifier skips the faulting rule and the orchestrator reports it in
/// the per-rule results.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Store(#[from] paycode_store::StoreError),

    #[error(transparent)]
    Registry(#[from] paycode_registry::RegistryError),

    /// No pay rule exists under the given ID.
    #[error("pay rule {0} not found")]
    RuleNotFound(paycode_types::RuleId),

    /// A classification result could not be serialized for the
    /// execution log.
    #[error("failed to serialize classification result: {0}")]
    ResultSerialization(String),
}

/// Result type for classification operations.
pub type ClassifyResult<T> = Result<T, ClassifyError>;
