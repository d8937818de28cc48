//! Rule generation request entity and lifecycle status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{OrganizationId, RuleId};

// ── Lifecycle status ───────────────────────────────────────────────────

/// Lifecycle status of a rule generation request.
///
/// Normal flow: `Pending -> IntentExtracted -> GeneratingCode ->
/// CodeGenerated -> Active`, with `AutoFixing` as a bounded detour back
/// to `CodeGenerated`. Error-flow terminals remain editable by an
/// operator. `Generated` and `Complete` are legacy statuses still
/// accepted by activation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleStatus {
    Pending,
    IntentExtracted,
    GeneratingCode,
    CodeGenerated,
    AutoFixing,
    CompilationFailed,
    RequiresManualReview,
    LoadFailed,
    Active,
    ActivationFailed,
    CodeGenerationFailed,
    RegenerationFailed,
    /// Legacy: produced by the old one-shot generation path.
    Generated,
    /// Legacy: produced by the old one-shot generation path.
    Complete,
}

impl RuleStatus {
    /// Statuses from which activation may proceed.
    pub fn is_activatable(self) -> bool {
        matches!(self, Self::CodeGenerated | Self::Generated | Self::Complete)
    }

    /// Error-flow terminal statuses.
    pub fn is_failed(self) -> bool {
        matches!(
            self,
            Self::CompilationFailed
                | Self::RequiresManualReview
                | Self::LoadFailed
                | Self::ActivationFailed
                | Self::CodeGenerationFailed
                | Self::RegenerationFailed
        )
    }
}

impl std::fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pending => "Pending",
            Self::IntentExtracted => "IntentExtracted",
            Self::GeneratingCode => "GeneratingCode",
            Self::CodeGenerated => "CodeGenerated",
            Self::AutoFixing => "AutoFixing",
            Self::CompilationFailed => "CompilationFailed",
            Self::RequiresManualReview => "RequiresManualReview",
            Self::LoadFailed => "LoadFailed",
            Self::Active => "Active",
            Self::ActivationFailed => "ActivationFailed",
            Self::CodeGenerationFailed => "CodeGenerationFailed",
            Self::RegenerationFailed => "RegenerationFailed",
            Self::Generated => "Generated",
            Self::Complete => "Complete",
        };
        write!(f, "{name}")
    }
}

// ── Validation example ─────────────────────────────────────────────────

/// Optional example shift and expected outcome supplied with a rule
/// statement, threaded into the intent extraction prompt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleExample {
    pub shift_start: DateTime<Utc>,
    pub shift_end: DateTime<Utc>,
    pub expected_outcome: String,
}

// ── Generation request ─────────────────────────────────────────────────

/// An in-flight or historical rule generation attempt.
///
/// Never physically deleted; failed requests double as audit history and
/// stay queryable with their last status and diagnostic text.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleGenerationRequest {
    pub id: RuleId,
    pub rule_statement: String,
    pub rule_description: String,
    pub organization_id: OrganizationId,
    /// Structured interpretation of the statement, produced before code
    /// generation and reviewable by the operator.
    pub intent: String,
    /// Rule logic source text produced by the generation capability.
    pub generated_code: String,
    pub status: RuleStatus,
    /// Joined compilation error text from the latest failed attempt.
    pub compilation_errors: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    pub example: Option<RuleExample>,

    // Auto-fix bookkeeping.
    pub generation_attempt_count: u32,
    pub auto_fix_attempted: bool,
    /// Snapshot of the generated code before the auto-fix rewrite.
    pub original_generated_code: Option<String>,
    /// Snapshot of the errors that triggered the auto-fix.
    pub original_compilation_errors: Option<String>,
    pub auto_fixed_at: Option<DateTime<Utc>>,
    pub auto_fix_reason: Option<String>,
    pub requires_manual_review: bool,
}

impl RuleGenerationRequest {
    /// Create a fresh request in `Pending`.
    pub fn new(
        rule_statement: impl Into<String>,
        rule_description: impl Into<String>,
        organization_id: OrganizationId,
        created_by: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: RuleId::new(),
            rule_statement: rule_statement.into(),
            rule_description: rule_description.into(),
            organization_id,
            intent: String::new(),
            generated_code: String::new(),
            status: RuleStatus::Pending,
            compilation_errors: None,
            created_at: now,
            updated_at: now,
            created_by: created_by.into(),
            example: None,
            generation_attempt_count: 0,
            auto_fix_attempted: false,
            original_generated_code: None,
            original_compilation_errors: None,
            auto_fixed_at: None,
            auto_fix_reason: None,
            requires_manual_review: false,
        }
    }

    pub fn with_example(mut self, example: RuleExample) -> Self {
        self.example = Some(example);
        self
    }

    /// Transition to a new status and stamp the modification time.
    pub fn transition(&mut self, status: RuleStatus) {
        self.status = status;
        self.updated_at = Utc::now();
        if status == RuleStatus::RequiresManualReview {
            self.requires_manual_review = true;
        }
    }

    /// Reset auto-fix bookkeeping to its initial values, used by
    /// regeneration.
    pub fn reset_auto_fix(&mut self) {
        self.generation_attempt_count = 0;
        self.auto_fix_attempted = false;
        self.original_generated_code = None;
        self.original_compilation_errors = None;
        self.auto_fixed_at = None;
        self.auto_fix_reason = None;
        self.requires_manual_review = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_request_starts_pending() {
        let req = RuleGenerationRequest::new(
            "overtime after 8 hours",
            "standard overtime",
            OrganizationId::new("org-1"),
            "alice",
        );
        assert_eq!(req.status, RuleStatus::Pending);
        assert_eq!(req.generation_attempt_count, 0);
        assert!(!req.auto_fix_attempted);
        assert!(req.example.is_none());
    }

    #[test]
    fn transition_stamps_manual_review_flag() {
        let mut req = RuleGenerationRequest::new(
            "s",
            "d",
            OrganizationId::new("org-1"),
            "alice",
        );
        req.transition(RuleStatus::RequiresManualReview);
        assert!(req.requires_manual_review);
        assert_eq!(req.status, RuleStatus::RequiresManualReview);
    }

    #[test]
    fn reset_auto_fix_clears_bookkeeping() {
        let mut req = RuleGenerationRequest::new(
            "s",
            "d",
            OrganizationId::new("org-1"),
            "alice",
        );
        req.generation_attempt_count = 2;
        req.auto_fix_attempted = true;
        req.original_generated_code = Some("old".into());
        req.reset_auto_fix();
        assert_eq!(req.generation_attempt_count, 0);
        assert!(!req.auto_fix_attempted);
        assert!(req.original_generated_code.is_none());
    }

    #[test]
    fn activatable_statuses() {
        assert!(RuleStatus::CodeGenerated.is_activatable());
        assert!(RuleStatus::Generated.is_activatable());
        assert!(RuleStatus::Complete.is_activatable());
        assert!(!RuleStatus::Pending.is_activatable());
        assert!(!RuleStatus::Active.is_activatable());
    }

    #[test]
    fn failed_statuses() {
        assert!(RuleStatus::CompilationFailed.is_failed());
        assert!(RuleStatus::RequiresManualReview.is_failed());
        assert!(!RuleStatus::Active.is_failed());
        assert!(!RuleStatus::CodeGenerated.is_failed());
    }

    #[test]
    fn status_display_round_trip() {
        assert_eq!(RuleStatus::CodeGenerated.to_string(), "CodeGenerated");
        assert_eq!(
            RuleStatus::RequiresManualReview.to_string(),
            "RequiresManualReview"
        );
    }
}
