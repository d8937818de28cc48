//! Classification output values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hours allocated to one named pay code.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PayCodeAllocation {
    /// Pay code name, e.g. "Regular", "Overtime", "Holiday".
    pub pay_code: String,
    /// Allocated hours, non-negative under correct rule logic.
    pub hours: f64,
    /// Human-readable description of why the hours were allocated.
    pub description: String,
}

impl PayCodeAllocation {
    pub fn new(pay_code: impl Into<String>, hours: f64, description: impl Into<String>) -> Self {
        Self {
            pay_code: pay_code.into(),
            hours,
            description: description.into(),
        }
    }
}

/// Result of classifying one shift: an ordered list of pay code
/// allocations.
///
/// Total hours should not exceed the shift duration under correct rule
/// logic; that invariant is the generated rule's responsibility and is
/// not enforced here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShiftClassificationResult {
    pub employee_name: String,
    pub shift_start: DateTime<Utc>,
    pub shift_end: DateTime<Utc>,
    pub allocations: Vec<PayCodeAllocation>,
}

impl ShiftClassificationResult {
    /// Sum of all allocated hours.
    pub fn total_hours(&self) -> f64 {
        self.allocations.iter().map(|a| a.hours).sum()
    }

    /// Allocation for a specific pay code, if present.
    pub fn allocation(&self, pay_code: &str) -> Option<&PayCodeAllocation> {
        self.allocations.iter().find(|a| a.pay_code == pay_code)
    }
}
