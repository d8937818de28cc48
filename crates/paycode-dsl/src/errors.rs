//! Error and diagnostic types for the rule language.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the DSL crate itself.
///
/// Compile failures are not errors in this sense: they are reported as
/// diagnostics inside a `CompilationResult` because they are expected,
/// frequent outcomes of compiling LLM-generated text.
#[derive(Debug, Error)]
pub enum DslError {
    /// A compiled artifact could not be decoded back into a program.
    #[error("artifact decode failed: {0}")]
    ArtifactDecode(String),
}

/// Result type for DSL operations.
pub type DslResult<T> = Result<T, DslError>;

// ── Diagnostics ────────────────────────────────────────────────────────

/// Broad category of a compile diagnostic, used to decide whether a
/// failure is a candidate for automated repair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticCategory {
    /// Malformed source text: bad tokens, unbalanced braces, missing
    /// semicolons.
    Syntax,
    /// A name was used that is not bound anywhere in scope.
    NameResolution,
    /// Structurally valid but meaningless constructs.
    Semantic,
    /// Unexpected fault inside the compiler itself.
    Internal,
}

/// One compile diagnostic: an error or a warning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code, `P###` for parse, `V###` for validation.
    pub code: String,
    pub message: String,
    /// 1-based line in the caller-supplied logic text.
    pub line: usize,
    pub category: DiagnosticCategory,
}

impl Diagnostic {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        line: usize,
        category: DiagnosticCategory,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            line,
            category,
        }
    }

    /// Whether an automated repair attempt is plausible for this
    /// diagnostic. Everything the generation capability plausibly caused
    /// qualifies; internal compiler faults never do.
    pub fn is_auto_fixable(&self) -> bool {
        self.category != DiagnosticCategory::Internal
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (line {}): {}", self.code, self.line, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_diagnostics_are_auto_fixable() {
        let d = Diagnostic::new("P001", "unexpected token", 3, DiagnosticCategory::Syntax);
        assert!(d.is_auto_fixable());
    }

    #[test]
    fn internal_diagnostics_are_not_auto_fixable() {
        let d = Diagnostic::new("P999", "compiler fault", 0, DiagnosticCategory::Internal);
        assert!(!d.is_auto_fixable());
    }

    #[test]
    fn diagnostic_display_includes_line() {
        let d = Diagnostic::new("V001", "undefined name 'x'", 7, DiagnosticCategory::NameResolution);
        assert_eq!(d.to_string(), "V001 (line 7): undefined name 'x'");
    }
}
