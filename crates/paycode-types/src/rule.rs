//! Activated pay rule entity and the execution log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{OrganizationId, RuleId};

/// An activated, currently-or-formerly-loaded rule.
///
/// Invariants: `function_name` is globally unique per loaded unit;
/// `version` increments by exactly 1 on every accepted code change;
/// `is_active == true` implies the named unit is present in the
/// registry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PayRule {
    /// Shared with the originating generation request.
    pub id: RuleId,
    pub rule_statement: String,
    pub rule_description: String,
    /// Name the compiled unit is registered under.
    pub function_name: String,
    /// Current rule logic source text.
    pub generated_code: String,
    pub is_active: bool,
    pub version: u32,
    pub organization_id: OrganizationId,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub created_by: String,
    pub last_modified_by: String,
    /// Snapshot of the AI-generated logic before any manual edit.
    pub original_generated_code: Option<String>,
}

impl PayRule {
    pub fn new(
        id: RuleId,
        rule_statement: impl Into<String>,
        rule_description: impl Into<String>,
        function_name: impl Into<String>,
        generated_code: impl Into<String>,
        organization_id: OrganizationId,
        created_by: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        let created_by = created_by.into();
        Self {
            id,
            rule_statement: rule_statement.into(),
            rule_description: rule_description.into(),
            function_name: function_name.into(),
            generated_code: generated_code.into(),
            is_active: true,
            version: 1,
            organization_id,
            created_at: now,
            last_modified: now,
            last_modified_by: created_by.clone(),
            created_by,
            original_generated_code: None,
        }
    }

    /// Accept a new code revision: snapshot the original on the first
    /// edit, bump the version by exactly one, stamp the modifier.
    pub fn accept_code_revision(&mut self, new_code: impl Into<String>, modified_by: impl Into<String>) {
        if self.original_generated_code.is_none() {
            self.original_generated_code = Some(self.generated_code.clone());
        }
        self.generated_code = new_code.into();
        self.version += 1;
        self.last_modified = Utc::now();
        self.last_modified_by = modified_by.into();
    }
}

/// Append-only log entry recording one successful rule invocation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleExecution {
    pub id: RuleId,
    pub rule_id: RuleId,
    pub employee_name: String,
    pub shift_start: DateTime<Utc>,
    pub shift_end: DateTime<Utc>,
    /// Serialized `ShiftClassificationResult`.
    pub result_json: String,
    pub executed_at: DateTime<Utc>,
}

impl RuleExecution {
    pub fn new(
        rule_id: RuleId,
        employee_name: impl Into<String>,
        shift_start: DateTime<Utc>,
        shift_end: DateTime<Utc>,
        result_json: impl Into<String>,
    ) -> Self {
        Self {
            id: RuleId::new(),
            rule_id,
            employee_name: employee_name.into(),
            shift_start,
            shift_end,
            result_json: result_json.into(),
            executed_at: Utc::now(),
        }
    }
}
