//! Persistence traits for the paycode engine, plus in-memory backends.
//!
//! Every entity the lifecycle touches goes through a repository trait so
//! the engine stays agnostic of the backing store. The shipped
//! implementations are in-memory and suitable for development, testing,
//! and single-process deployments.

#![deny(unsafe_code)]

mod error;
mod memory;
mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::{
    InMemoryAuditStore, InMemoryExecutionStore, InMemoryRequestStore, InMemoryRuleStore,
};
pub use traits::{
    CompilationAuditRepository, GenerationRequestRepository, PayRuleRepository,
    RuleExecutionRepository,
};
