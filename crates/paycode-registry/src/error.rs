//! Registry errors.

use thiserror::Error;

/// Errors surfaced by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A compiled artifact failed to instantiate into a program.
    #[error("failed to load unit '{unit_name}': {reason}")]
    LoadFailed { unit_name: String, reason: String },

    /// Stored rules could not be read while warming an organization.
    #[error("failed to read stored rules: {0}")]
    Store(#[from] paycode_store::StoreError),
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
