//! Compilation audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::RuleId;

/// Who or what initiated a compile attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptType {
    /// Hand-edited code submitted by an operator.
    Manual,
    /// Automated repair attempt.
    Auto,
    /// First compile of freshly generated code.
    AiGenerated,
}

impl std::fmt::Display for AttemptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Manual => write!(f, "Manual"),
            Self::Auto => write!(f, "Auto"),
            Self::AiGenerated => write!(f, "AI-Generated"),
        }
    }
}

/// Append-only record of one compile attempt, created regardless of
/// outcome and never mutated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleCompilationAudit {
    pub id: RuleId,
    pub rule_id: RuleId,
    pub attempted_code: String,
    pub success: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub attempted_at: DateTime<Utc>,
    pub attempted_by: String,
    pub attempt_type: AttemptType,
    /// Rule version this attempt was made against.
    pub rule_version_attempted: u32,
}

impl RuleCompilationAudit {
    pub fn new(
        rule_id: RuleId,
        attempted_code: impl Into<String>,
        success: bool,
        errors: Vec<String>,
        warnings: Vec<String>,
        attempted_by: impl Into<String>,
        attempt_type: AttemptType,
        rule_version_attempted: u32,
    ) -> Self {
        Self {
            id: RuleId::new(),
            rule_id,
            attempted_code: attempted_code.into(),
            success,
            errors,
            warnings,
            attempted_at: Utc::now(),
            attempted_by: attempted_by.into(),
            attempt_type,
            rule_version_attempted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempt_type_display() {
        assert_eq!(AttemptType::Manual.to_string(), "Manual");
        assert_eq!(AttemptType::Auto.to_string(), "Auto");
        assert_eq!(AttemptType::AiGenerated.to_string(), "AI-Generated");
    }

    #[test]
    fn audit_records_outcome() {
        let rule_id = RuleId::new();
        let audit = RuleCompilationAudit::new(
            rule_id,
            "bad code",
            false,
            vec!["unexpected token".into()],
            vec![],
            "alice",
            AttemptType::Manual,
            3,
        );
        assert_eq!(audit.rule_id, rule_id);
        assert!(!audit.success);
        assert_eq!(audit.errors.len(), 1);
        assert_eq!(audit.rule_version_attempted, 3);
    }
}
