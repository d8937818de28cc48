//! The rule generation lifecycle engine.

use std::sync::Arc;

use chrono::Utc;
use paycode_dsl::RuleCompiler;
use paycode_registry::UnitRegistry;
use paycode_store::{CompilationAuditRepository, GenerationRequestRepository, PayRuleRepository};
use paycode_types::{
    AttemptType, OrganizationId, PayRule, RuleCompilationAudit, RuleExample,
    RuleGenerationRequest, RuleId, RuleStatus,
};
use tracing::{info, warn};

use crate::capability::{SimilaritySearch, TextGenerator};
use crate::error::{GenerationError, GenerationResult};
use crate::prompts;

/// Number of similar rules threaded into the code generation prompt.
const SIMILAR_RULE_LIMIT: usize = 3;

/// Terminal outcome of one activation call.
///
/// Compile failures are values, not errors: each variant corresponds to
/// a persisted request status the operator can act on.
#[derive(Debug)]
pub enum ActivationOutcome {
    /// The rule compiled, loaded, and is now live.
    Activated(PayRule),
    /// Compilation failed and no repair was attempted.
    CompilationFailed { errors: String },
    /// Compilation failed again after the one automated repair attempt,
    /// or the repair itself could not be produced.
    RequiresManualReview { errors: String },
    /// The artifact compiled but could not be loaded into the registry.
    LoadFailed { reason: String },
}

/// Drives rule statements from free text to loaded units.
pub struct RuleLifecycle {
    requests: Arc<dyn GenerationRequestRepository>,
    rules: Arc<dyn PayRuleRepository>,
    audits: Arc<dyn CompilationAuditRepository>,
    registry: Arc<UnitRegistry>,
    generator: Arc<dyn TextGenerator>,
    similarity: Arc<dyn SimilaritySearch>,
    compiler: RuleCompiler,
}

impl RuleLifecycle {
    pub fn new(
        requests: Arc<dyn GenerationRequestRepository>,
        rules: Arc<dyn PayRuleRepository>,
        audits: Arc<dyn CompilationAuditRepository>,
        registry: Arc<UnitRegistry>,
        generator: Arc<dyn TextGenerator>,
        similarity: Arc<dyn SimilaritySearch>,
    ) -> Self {
        Self {
            requests,
            rules,
            audits,
            registry,
            generator,
            similarity,
            compiler: RuleCompiler::new(),
        }
    }

    // ── Submission ───────────────────────────────────────────────────

    /// Record a new rule statement for generation.
    pub async fn submit(
        &self,
        rule_statement: impl Into<String>,
        rule_description: impl Into<String>,
        organization_id: OrganizationId,
        created_by: impl Into<String>,
        example: Option<RuleExample>,
    ) -> GenerationResult<RuleGenerationRequest> {
        let mut request = RuleGenerationRequest::new(
            rule_statement,
            rule_description,
            organization_id,
            created_by,
        );
        if let Some(example) = example {
            request = request.with_example(example);
        }
        self.requests.add(request.clone()).await?;
        info!(request = %request.id, "rule generation request submitted");
        Ok(request)
    }

    // ── Two-step generation ──────────────────────────────────────────

    /// Interpret the rule statement into a reviewable intent.
    pub async fn extract_intent(&self, id: &RuleId) -> GenerationResult<RuleGenerationRequest> {
        let mut request = self.require_request(id).await?;
        self.require_status(&request, RuleStatus::Pending)?;

        let prompt = prompts::intent_prompt(
            &request.rule_statement,
            &request.rule_description,
            request.example.as_ref(),
        );
        match self.generator.generate(&prompt).await {
            Ok(intent) => {
                request.intent = intent.trim().to_owned();
                request.transition(RuleStatus::IntentExtracted);
                self.requests.update(request.clone()).await?;
                Ok(request)
            }
            Err(e) => {
                request.transition(RuleStatus::CodeGenerationFailed);
                self.requests.update(request).await?;
                Err(e)
            }
        }
    }

    /// Generate rule logic from an extracted intent.
    pub async fn generate_code(&self, id: &RuleId) -> GenerationResult<RuleGenerationRequest> {
        let mut request = self.require_request(id).await?;
        self.require_status(&request, RuleStatus::IntentExtracted)?;

        request.transition(RuleStatus::GeneratingCode);
        self.requests.update(request.clone()).await?;

        let similar = match self
            .similarity
            .find_similar(
                &request.rule_statement,
                &request.organization_id,
                SIMILAR_RULE_LIMIT,
            )
            .await
        {
            Ok(similar) => similar,
            Err(e) => {
                // Similar-rule context is an enrichment, not a
                // prerequisite.
                warn!(request = %request.id, error = %e, "similarity lookup failed");
                Vec::new()
            }
        };

        let prompt =
            prompts::codegen_prompt(&request.rule_statement, &request.intent, &similar);
        match self.generator.generate(&prompt).await {
            Ok(code) => {
                request.generated_code = strip_code_fences(&code);
                request.generation_attempt_count = 1;
                request.transition(RuleStatus::CodeGenerated);
                self.requests.update(request.clone()).await?;
                info!(request = %request.id, "rule code generated");
                Ok(request)
            }
            Err(e) => {
                request.transition(RuleStatus::CodeGenerationFailed);
                self.requests.update(request).await?;
                Err(e)
            }
        }
    }

    /// Legacy one-shot path: intent extraction and code generation in a
    /// single call, ending in `Generated`.
    pub async fn generate(&self, id: &RuleId) -> GenerationResult<RuleGenerationRequest> {
        self.extract_intent(id).await?;
        let mut request = self.generate_code(id).await?;
        request.transition(RuleStatus::Generated);
        self.requests.update(request.clone()).await?;
        Ok(request)
    }

    // ── Activation ───────────────────────────────────────────────────

    /// Compile, load, and activate a generated rule, with at most one
    /// automated repair attempt on compile failure.
    ///
    /// Infrastructure failures are recorded on the request as
    /// `ActivationFailed` before propagating, so the entity always
    /// reflects what happened.
    pub async fn activate(&self, id: &RuleId) -> GenerationResult<ActivationOutcome> {
        match self.activate_inner(id).await {
            Ok(outcome) => Ok(outcome),
            Err(e @ GenerationError::InvalidStatus { .. })
            | Err(e @ GenerationError::RequestNotFound(_)) => Err(e),
            Err(e) => {
                self.mark_activation_failed(id, &e).await;
                Err(e)
            }
        }
    }

    async fn activate_inner(&self, id: &RuleId) -> GenerationResult<ActivationOutcome> {
        let mut request = self.require_request(id).await?;
        if !request.status.is_activatable() {
            return Err(GenerationError::InvalidStatus {
                id: *id,
                status: request.status.to_string(),
                expected: "CodeGenerated".into(),
            });
        }

        let function_name = format!("rule_{}", id.simple());
        // Reactivations compile against the stored rule's current
        // version, first activations against version 1.
        let version_attempted = self.rules.get(id).await?.map_or(1, |rule| rule.version);

        loop {
            let result = self.compiler.compile(&request.generated_code, &function_name);
            let attempt_type = if request.auto_fix_attempted {
                AttemptType::Auto
            } else {
                AttemptType::AiGenerated
            };
            self.audits
                .record(RuleCompilationAudit::new(
                    *id,
                    request.generated_code.clone(),
                    result.success,
                    result.errors.iter().map(ToString::to_string).collect(),
                    result.warnings.iter().map(ToString::to_string).collect(),
                    request.created_by.clone(),
                    attempt_type,
                    version_attempted,
                ))
                .await?;

            if let Some(artifact) = result.artifact {
                if let Err(e) = self.registry.load(&artifact) {
                    request.transition(RuleStatus::LoadFailed);
                    self.requests.update(request).await?;
                    warn!(request = %id, error = %e, "compiled rule failed to load");
                    return Ok(ActivationOutcome::LoadFailed {
                        reason: e.to_string(),
                    });
                }

                // Upsert: a previously deactivated rule comes back to
                // life under the same identity.
                let rule = match self.rules.get(id).await? {
                    Some(mut existing) => {
                        existing.generated_code = request.generated_code.clone();
                        existing.is_active = true;
                        existing.last_modified = Utc::now();
                        existing.last_modified_by = request.created_by.clone();
                        self.rules.update(existing.clone()).await?;
                        existing
                    }
                    None => {
                        let rule = PayRule::new(
                            *id,
                            request.rule_statement.clone(),
                            request.rule_description.clone(),
                            function_name.clone(),
                            request.generated_code.clone(),
                            request.organization_id.clone(),
                            request.created_by.clone(),
                        );
                        self.rules.add(rule.clone()).await?;
                        rule
                    }
                };
                if let Err(e) = self.similarity.index(&rule).await {
                    warn!(rule = %rule.id, error = %e, "similarity indexing failed");
                }
                // Rules activated after the warm-up must still reach the
                // classifier.
                self.registry.invalidate_warm(&request.organization_id);

                request.compilation_errors = None;
                request.transition(RuleStatus::Active);
                self.requests.update(request).await?;
                info!(rule = %rule.id, unit = %function_name, "rule activated");
                return Ok(ActivationOutcome::Activated(rule));
            }

            let error_text = result.error_text();
            request.compilation_errors = Some(error_text.clone());

            let fixable = result.is_auto_fixable()
                && !request.auto_fix_attempted
                && request.generation_attempt_count == 1;
            if fixable {
                request.transition(RuleStatus::AutoFixing);
                request.original_generated_code = Some(request.generated_code.clone());
                request.original_compilation_errors = Some(error_text.clone());
                request.auto_fix_reason = Some(repair_reason(&result.errors));
                self.requests.update(request.clone()).await?;
                info!(request = %id, "attempting automated repair");

                let prompt = prompts::fix_prompt(&request.generated_code, &error_text);
                let fixed = match self.generator.generate(&prompt).await {
                    Ok(fixed) => strip_code_fences(&fixed),
                    Err(e) => {
                        warn!(request = %id, error = %e, "repair generation failed");
                        String::new()
                    }
                };
                if fixed.is_empty() {
                    request.auto_fix_reason =
                        Some("LLM failed to generate fixed code".into());
                    request.transition(RuleStatus::RequiresManualReview);
                    self.requests.update(request).await?;
                    return Ok(ActivationOutcome::RequiresManualReview {
                        errors: error_text,
                    });
                }
                request.generated_code = fixed;
                request.auto_fix_attempted = true;
                request.generation_attempt_count += 1;
                request.auto_fixed_at = Some(Utc::now());
                request.transition(RuleStatus::CodeGenerated);
                self.requests.update(request.clone()).await?;
                continue;
            }

            return if request.auto_fix_attempted {
                request.transition(RuleStatus::RequiresManualReview);
                self.requests.update(request).await?;
                Ok(ActivationOutcome::RequiresManualReview { errors: error_text })
            } else {
                request.transition(RuleStatus::CompilationFailed);
                self.requests.update(request).await?;
                Ok(ActivationOutcome::CompilationFailed { errors: error_text })
            };
        }
    }

    // ── Deactivation and regeneration ────────────────────────────────

    /// Deactivate a rule and remove its unit. Returns `false` when no
    /// such rule exists; deactivating an already-inactive rule is not an
    /// error.
    pub async fn deactivate(&self, rule_id: &RuleId) -> GenerationResult<bool> {
        let Some(mut rule) = self.rules.get(rule_id).await? else {
            return Ok(false);
        };
        rule.is_active = false;
        rule.last_modified = Utc::now();
        self.rules.update(rule.clone()).await?;
        self.registry.unload(&rule.function_name);
        info!(rule = %rule_id, unit = %rule.function_name, "rule deactivated");
        Ok(true)
    }

    /// Throw away prior generation state and run intent extraction and
    /// code generation again from the original statement.
    pub async fn regenerate(&self, id: &RuleId) -> GenerationResult<RuleGenerationRequest> {
        let mut request = self.require_request(id).await?;
        request.reset_auto_fix();
        request.intent.clear();
        request.generated_code.clear();
        request.compilation_errors = None;
        request.transition(RuleStatus::Pending);
        self.requests.update(request).await?;

        match self.extract_intent(id).await {
            Ok(_) => {}
            Err(e) => {
                self.mark_regeneration_failed(id).await?;
                return Err(e);
            }
        }
        match self.generate_code(id).await {
            Ok(request) => Ok(request),
            Err(e) => {
                self.mark_regeneration_failed(id).await?;
                Err(e)
            }
        }
    }

    /// Best-effort: stamp `ActivationFailed` with the failure text
    /// before the error propagates.
    async fn mark_activation_failed(&self, id: &RuleId, error: &GenerationError) {
        let Ok(Some(mut request)) = self.requests.get(id).await else {
            return;
        };
        request.compilation_errors = Some(error.to_string());
        request.transition(RuleStatus::ActivationFailed);
        if let Err(e) = self.requests.update(request).await {
            warn!(request = %id, error = %e, "failed to record activation failure");
        }
    }

    async fn mark_regeneration_failed(&self, id: &RuleId) -> GenerationResult<()> {
        let mut request = self.require_request(id).await?;
        request.transition(RuleStatus::RegenerationFailed);
        self.requests.update(request).await?;
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub async fn get_request(
        &self,
        id: &RuleId,
    ) -> GenerationResult<Option<RuleGenerationRequest>> {
        Ok(self.requests.get(id).await?)
    }

    pub async fn list_requests(
        &self,
        organization_id: &OrganizationId,
    ) -> GenerationResult<Vec<RuleGenerationRequest>> {
        Ok(self.requests.list(organization_id).await?)
    }

    /// Requests whose last attempt recorded compile errors, for the
    /// manual review queue.
    pub async fn list_requests_with_errors(
        &self,
        organization_id: &OrganizationId,
    ) -> GenerationResult<Vec<RuleGenerationRequest>> {
        Ok(self.requests.list_with_errors(organization_id).await?)
    }

    pub async fn get_rule(&self, id: &RuleId) -> GenerationResult<Option<PayRule>> {
        Ok(self.rules.get(id).await?)
    }

    pub async fn list_rules(
        &self,
        organization_id: &OrganizationId,
    ) -> GenerationResult<Vec<PayRule>> {
        Ok(self.rules.list_all(organization_id).await?)
    }

    pub async fn list_active_rules(
        &self,
        organization_id: &OrganizationId,
    ) -> GenerationResult<Vec<PayRule>> {
        Ok(self.rules.list_active(organization_id).await?)
    }

    // ── Internals ────────────────────────────────────────────────────

    async fn require_request(&self, id: &RuleId) -> GenerationResult<RuleGenerationRequest> {
        self.requests
            .get(id)
            .await?
            .ok_or(GenerationError::RequestNotFound(*id))
    }

    fn require_status(
        &self,
        request: &RuleGenerationRequest,
        expected: RuleStatus,
    ) -> GenerationResult<()> {
        if request.status == expected {
            Ok(())
        } else {
            Err(GenerationError::InvalidStatus {
                id: request.id,
                status: request.status.to_string(),
                expected: expected.to_string(),
            })
        }
    }
}

/// Short repair summary stored as the auto-fix reason.
fn repair_reason(errors: &[paycode_dsl::Diagnostic]) -> String {
    let preview: Vec<String> = errors.iter().take(3).map(ToString::to_string).collect();
    format!("{} compilation error(s): {}", errors.len(), preview.join("; "))
}

/// Strip markdown code fences a provider may wrap its response in.
fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_owned();
    };
    // Drop the fence line (which may carry a language tag) and the
    // closing fence.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
        .to_owned()
}
