//! Shift classification over loaded rule units.
//!
//! Two evaluation strategies share the unit registry:
//!
//! * [`ShiftClassifier`] runs active rules in creation order and takes
//!   the first one that executes without a fault, falling back to a
//!   default Regular allocation only when no rule succeeds.
//! * [`RuleOrchestrator`] runs every active rule, reports each rule's
//!   outcome, and combines all allocations with pay-code conflict
//!   resolution.

#![deny(unsafe_code)]

mod classifier;
mod error;
mod orchestrator;

pub use classifier::{RuleTestOutcome, ShiftClassifier};
pub use error::{ClassifyError, ClassifyResult};
pub use orchestrator::{
    ConflictClaim, RuleConflict, RuleOrchestrationResult, RuleOrchestrator, RuleTestResult,
};
