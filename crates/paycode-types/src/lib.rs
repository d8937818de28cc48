//! Domain types for the paycode rule engine.
//!
//! Value types (shifts, classification results), persisted entities
//! (pay rules, generation requests, compilation audits, execution log
//! entries), lifecycle statuses, and the `PayrollClassifier` capability
//! trait that every loaded rule unit implements.

#![deny(unsafe_code)]

mod audit;
mod classification;
mod classifier;
mod ids;
mod request;
mod rule;
mod shift;
mod similarity;

pub use audit::{AttemptType, RuleCompilationAudit};
pub use classification::{PayCodeAllocation, ShiftClassificationResult};
pub use classifier::{ExecutionError, PayrollClassifier};
pub use ids::{OrganizationId, RuleId};
pub use request::{RuleExample, RuleGenerationRequest, RuleStatus};
pub use rule::{PayRule, RuleExecution};
pub use shift::Shift;
pub use similarity::RuleSimilarity;
