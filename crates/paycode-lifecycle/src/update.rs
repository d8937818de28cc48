//! Manual code update pipeline.
//!
//! Operators can hand-edit the logic of an activated rule or repair a
//! failed generation request. Every attempt, successful or not, leaves
//! an audit row.

use std::sync::Arc;

use paycode_dsl::RuleCompiler;
use paycode_registry::UnitRegistry;
use paycode_store::{CompilationAuditRepository, GenerationRequestRepository, PayRuleRepository};
use paycode_types::{AttemptType, PayRule, RuleCompilationAudit, RuleId, RuleStatus};
use tracing::{info, warn};

use crate::error::{GenerationError, GenerationResult};

/// Outcome of one manual update attempt.
#[derive(Debug)]
pub enum UpdateOutcome {
    /// The new code compiled, was stored, and is live if the rule is
    /// active.
    Updated(PayRule),
    /// The new code did not compile; nothing was stored.
    CompilationFailed { errors: String },
    /// The new code compiled and was stored, but the running unit could
    /// not be swapped. The stored rule and the loaded unit now differ.
    CompiledButLoadFailed { rule: PayRule, reason: String },
}

/// Applies operator-supplied code revisions to rules and failed
/// requests.
pub struct CodeUpdatePipeline {
    rules: Arc<dyn PayRuleRepository>,
    requests: Arc<dyn GenerationRequestRepository>,
    audits: Arc<dyn CompilationAuditRepository>,
    registry: Arc<UnitRegistry>,
    compiler: RuleCompiler,
}

impl CodeUpdatePipeline {
    pub fn new(
        rules: Arc<dyn PayRuleRepository>,
        requests: Arc<dyn GenerationRequestRepository>,
        audits: Arc<dyn CompilationAuditRepository>,
        registry: Arc<UnitRegistry>,
    ) -> Self {
        Self {
            rules,
            requests,
            audits,
            registry,
            compiler: RuleCompiler::new(),
        }
    }

    /// Apply a hand-edited code revision.
    ///
    /// The target is looked up as a pay rule first, then as a failed
    /// generation request. For an active rule the running unit is
    /// hot-swapped; for a request with no rule yet, an inactive rule
    /// shell is created that activation can later pick up.
    pub async fn update_code(
        &self,
        id: &RuleId,
        new_code: &str,
        modified_by: &str,
    ) -> GenerationResult<UpdateOutcome> {
        let rule = self.rules.get(id).await?;
        let request = self.requests.get(id).await?;
        if rule.is_none() && request.is_none() {
            return Err(GenerationError::RuleNotFound(*id));
        }

        let function_name = rule
            .as_ref()
            .map(|r| r.function_name.clone())
            .unwrap_or_else(|| format!("rule_{}", id.simple()));
        let version_attempted = rule.as_ref().map_or(1, |r| r.version + 1);

        let result = self.compiler.compile(new_code, &function_name);
        self.audits
            .record(RuleCompilationAudit::new(
                *id,
                new_code,
                result.success,
                result.errors.iter().map(ToString::to_string).collect(),
                result.warnings.iter().map(ToString::to_string).collect(),
                modified_by,
                AttemptType::Manual,
                version_attempted,
            ))
            .await?;

        let Some(artifact) = result.artifact else {
            let errors = result.error_text();
            // The rule keeps its last good code, but the request shows
            // the operator's latest attempt.
            if let Some(mut request) = request {
                request.generated_code = new_code.to_owned();
                request.compilation_errors = Some(errors.clone());
                self.requests.update(request).await?;
            }
            return Ok(UpdateOutcome::CompilationFailed { errors });
        };

        let rule = match rule {
            Some(mut rule) => {
                rule.accept_code_revision(new_code, modified_by);
                self.rules.update(rule.clone()).await?;
                if rule.is_active {
                    if let Err(e) = self.registry.load(&artifact) {
                        warn!(rule = %id, error = %e, "updated code compiled but failed to load");
                        return Ok(UpdateOutcome::CompiledButLoadFailed {
                            rule,
                            reason: e.to_string(),
                        });
                    }
                }
                rule
            }
            None => {
                // Repairing a request that never activated: store an
                // inactive shell so activation has something to promote.
                let request_ref = request.as_ref().ok_or(GenerationError::RuleNotFound(*id))?;
                let mut shell = PayRule::new(
                    *id,
                    request_ref.rule_statement.clone(),
                    request_ref.rule_description.clone(),
                    function_name,
                    new_code,
                    request_ref.organization_id.clone(),
                    modified_by,
                );
                shell.is_active = false;
                self.rules.add(shell.clone()).await?;
                shell
            }
        };

        // An active rule's request stays Active; only a still-failing
        // request is moved back into the activatable state.
        if let Some(mut request) = request {
            if request.status != RuleStatus::Active {
                request.generated_code = new_code.to_owned();
                request.compilation_errors = None;
                request.transition(RuleStatus::CodeGenerated);
                self.requests.update(request).await?;
            }
        }

        info!(rule = %id, version = rule.version, "manual code update applied");
        Ok(UpdateOutcome::Updated(rule))
    }
}
