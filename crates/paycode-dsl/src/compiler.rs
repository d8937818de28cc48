//! Rule compiler: wrap, parse, validate, and package rule logic.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ast::RuleAst;
use crate::errors::{Diagnostic, DiagnosticCategory, DslError, DslResult};
use crate::parser::parse_body;
use crate::program::RuleProgram;
use crate::validator::validate;

/// Outcome of one compile attempt. Compile failures are data, not
/// errors: callers inspect the diagnostics to decide between automated
/// repair and manual review.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompilationResult {
    pub success: bool,
    /// Loadable artifact, present only on success.
    pub artifact: Option<CompiledArtifact>,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    /// The full classifier shell the logic was compiled inside, kept for
    /// diagnostics display and the audit trail.
    pub wrapped_source: String,
}

impl CompilationResult {
    /// Whether every error is one an automated repair attempt could
    /// plausibly address. False when there are no errors at all.
    pub fn is_auto_fixable(&self) -> bool {
        !self.errors.is_empty() && self.errors.iter().all(Diagnostic::is_auto_fixable)
    }

    /// All error diagnostics joined for prompts and audit rows.
    pub fn error_text(&self) -> String {
        self.errors
            .iter()
            .map(Diagnostic::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Portable compiled form of one rule unit: the validated syntax tree
/// serialized to bytes, plus the unit name it loads under.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompiledArtifact {
    pub unit_name: String,
    bytes: Vec<u8>,
}

impl CompiledArtifact {
    /// Decode the artifact into an executable program.
    pub fn instantiate(&self) -> DslResult<RuleProgram> {
        let ast: RuleAst = serde_json::from_slice(&self.bytes)
            .map_err(|e| DslError::ArtifactDecode(e.to_string()))?;
        Ok(RuleProgram::new(ast))
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

/// Compiles caller-supplied rule logic into loadable artifacts.
#[derive(Clone, Debug, Default)]
pub struct RuleCompiler;

impl RuleCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Compile a statement body under the given unit name.
    ///
    /// Never panics on malformed input; internal faults are folded into
    /// the result as a single `Internal` diagnostic.
    pub fn compile(&self, logic: &str, unit_name: &str) -> CompilationResult {
        let program_name = format!("{unit_name}_classifier");
        let wrapped_source = render_shell(&program_name, logic);

        let body = match parse_body(logic) {
            Ok(body) => body,
            Err(diagnostic) => {
                debug!(unit = unit_name, code = %diagnostic.code, "parse failed");
                return CompilationResult {
                    success: false,
                    artifact: None,
                    errors: vec![diagnostic],
                    warnings: Vec::new(),
                    wrapped_source,
                };
            }
        };

        let ast = RuleAst { name: program_name, body };
        let (errors, warnings) = validate(&ast);
        if !errors.is_empty() {
            debug!(unit = unit_name, errors = errors.len(), "validation failed");
            return CompilationResult {
                success: false,
                artifact: None,
                errors,
                warnings,
                wrapped_source,
            };
        }

        match serde_json::to_vec(&ast) {
            Ok(bytes) => CompilationResult {
                success: true,
                artifact: Some(CompiledArtifact {
                    unit_name: unit_name.to_owned(),
                    bytes,
                }),
                errors: Vec::new(),
                warnings,
                wrapped_source,
            },
            Err(e) => CompilationResult {
                success: false,
                artifact: None,
                errors: vec![Diagnostic::new(
                    "P999",
                    format!("internal compiler fault: {e}"),
                    0,
                    DiagnosticCategory::Internal,
                )],
                warnings,
                wrapped_source,
            },
        }
    }
}

/// Render the classifier shell the logic conceptually runs inside. Kept
/// human-readable for stored code and compile audit rows.
fn render_shell(program_name: &str, logic: &str) -> String {
    let mut out = format!("rule {program_name}(shift) {{\n");
    for line in logic.lines() {
        out.push_str("    ");
        out.push_str(line);
        out.push('\n');
    }
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use paycode_types::{OrganizationId, PayrollClassifier, Shift};

    const VALID_LOGIC: &str = "allocate \"Regular\" shift.total_hours;";

    #[test]
    fn compiles_valid_logic() {
        let result = RuleCompiler::new().compile(VALID_LOGIC, "rule_abc");
        assert!(result.success);
        assert!(result.errors.is_empty());
        let artifact = result.artifact.unwrap();
        assert_eq!(artifact.unit_name, "rule_abc");
        assert!(artifact.size_bytes() > 0);
    }

    #[test]
    fn artifact_round_trips_to_runnable_program() {
        let result = RuleCompiler::new().compile(VALID_LOGIC, "rule_abc");
        let program = result.artifact.unwrap().instantiate().unwrap();
        assert_eq!(program.rule_name(), "rule_abc_classifier");

        let shift = Shift::new(
            "Alice",
            Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 2, 16, 0, 0).unwrap(),
            OrganizationId::new("org-1"),
        );
        let classification = program.calculate_payroll(&shift).unwrap();
        assert_eq!(classification.total_hours(), 8.0);
    }

    #[test]
    fn syntax_error_is_auto_fixable() {
        let result = RuleCompiler::new().compile("allocate \"Regular\" 8", "rule_abc");
        assert!(!result.success);
        assert!(result.artifact.is_none());
        assert!(result.is_auto_fixable());
        assert!(!result.error_text().is_empty());
    }

    #[test]
    fn validation_errors_block_compilation() {
        let result = RuleCompiler::new().compile("allocate \"Regular\" missing;", "rule_abc");
        assert!(!result.success);
        assert_eq!(result.errors[0].code, "V001");
        assert!(result.is_auto_fixable());
    }

    #[test]
    fn warnings_survive_successful_compile() {
        let result = RuleCompiler::new().compile(
            "let unused = 1;\nallocate \"Regular\" shift.total_hours;",
            "rule_abc",
        );
        assert!(result.success);
        assert!(result.warnings.iter().any(|w| w.code == "V011"));
    }

    #[test]
    fn success_is_never_auto_fixable() {
        let result = RuleCompiler::new().compile(VALID_LOGIC, "rule_abc");
        assert!(!result.is_auto_fixable());
    }

    #[test]
    fn wrapped_source_names_the_unit() {
        let result = RuleCompiler::new().compile(VALID_LOGIC, "rule_abc");
        assert!(result.wrapped_source.starts_with("rule rule_abc_classifier(shift) {"));
        assert!(result.wrapped_source.contains("allocate \"Regular\""));
    }

    #[test]
    fn error_text_joins_multiple_errors() {
        let result = RuleCompiler::new().compile(
            "allocate \"Regular\" a;\nallocate \"Overtime\" b;",
            "rule_abc",
        );
        assert_eq!(result.errors.len(), 2);
        assert!(result.error_text().contains("; "));
    }
}
