//! The capability trait implemented by every loaded rule unit.

use thiserror::Error;

use crate::classification::ShiftClassificationResult;
use crate::shift::Shift;

/// Runtime fault raised by a rule unit while classifying a shift.
///
/// These are expected, frequent outcomes of running LLM-generated logic:
/// the classifier logs them and moves on to the next rule.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ExecutionError {
    /// Division by zero in a rule expression.
    #[error("division by zero in rule expression")]
    DivisionByZero,

    /// A rule allocated negative hours to a pay code.
    #[error("negative allocation of {hours} hours to pay code '{pay_code}'")]
    NegativeAllocation { pay_code: String, hours: f64 },

    /// A rule read a name that was never bound.
    #[error("undefined name '{0}' in rule expression")]
    UndefinedName(String),

    /// Any other rule runtime fault.
    #[error("rule execution failed: {0}")]
    Message(String),
}

/// Single-method capability interface every compiled rule unit exposes.
///
/// The loader instantiates exactly one implementor per unit name; the
/// classifier and orchestrator invoke it through the registry.
pub trait PayrollClassifier: Send + Sync {
    /// Classify one shift into pay code allocations.
    fn calculate_payroll(&self, shift: &Shift) -> Result<ShiftClassificationResult, ExecutionError>;

    /// The unit name this classifier is registered under.
    fn rule_name(&self) -> &str;
}
