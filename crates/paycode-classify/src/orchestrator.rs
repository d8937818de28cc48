//! Multi-rule orchestration with pay-code conflict resolution.

use std::sync::Arc;

use paycode_registry::UnitRegistry;
use paycode_store::{PayRuleRepository, RuleExecutionRepository};
use paycode_types::{
    PayCodeAllocation, RuleExecution, RuleId, Shift, ShiftClassificationResult,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classifier::default_classification;
use crate::error::{ClassifyError, ClassifyResult};

/// One rule's outcome inside an orchestration run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleTestResult {
    pub rule_id: RuleId,
    pub rule_statement: String,
    pub function_name: String,
    pub success: bool,
    /// Runtime fault text when `success` is false.
    pub error: Option<String>,
    pub allocations: Vec<PayCodeAllocation>,
}

/// One rule's claim inside a pay-code conflict.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConflictClaim {
    pub rule_id: RuleId,
    pub rule_statement: String,
    pub function_name: String,
    pub hours: f64,
    pub description: String,
}

/// A pay code claimed by more than one rule, and how it was resolved.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleConflict {
    pub pay_code: String,
    /// Every claim on this pay code, in rule creation order.
    pub claims: Vec<ConflictClaim>,
    /// Unit name of the rule whose allocation was kept.
    pub winner_function: String,
    pub winning_hours: f64,
}

/// Full outcome of running every active rule against one shift.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleOrchestrationResult {
    pub employee_name: String,
    /// Per-rule outcomes in rule creation order.
    pub rule_results: Vec<RuleTestResult>,
    pub conflicts: Vec<RuleConflict>,
    /// Combined allocations after conflict resolution.
    pub combined: ShiftClassificationResult,
    /// Whether no rule allocated anything and the default was used.
    pub used_default: bool,
}

/// Runs every active rule against a shift and combines the allocations.
///
/// Unlike the first-match classifier this surfaces each rule's view of
/// the shift, so operators can see how rules interact before trusting
/// the combined result. Every successful per-rule invocation is logged
/// to the execution trail.
pub struct RuleOrchestrator {
    rules: Arc<dyn PayRuleRepository>,
    executions: Arc<dyn RuleExecutionRepository>,
    registry: Arc<UnitRegistry>,
}

impl RuleOrchestrator {
    pub fn new(
        rules: Arc<dyn PayRuleRepository>,
        executions: Arc<dyn RuleExecutionRepository>,
        registry: Arc<UnitRegistry>,
    ) -> Self {
        Self { rules, executions, registry }
    }

    /// Run all active rules of the shift's organization against it.
    pub async fn test_all_rules(&self, shift: &Shift) -> ClassifyResult<RuleOrchestrationResult> {
        self.registry
            .preload_organization(&shift.organization_id)
            .await?;

        let rules = self.rules.list_active(&shift.organization_id).await?;
        let mut rule_results = Vec::with_capacity(rules.len());

        for rule in &rules {
            let Some(unit) = self.registry.get(&rule.function_name) else {
                warn!(unit = %rule.function_name, "active rule has no loaded unit");
                rule_results.push(RuleTestResult {
                    rule_id: rule.id,
                    rule_statement: rule.rule_statement.clone(),
                    function_name: rule.function_name.clone(),
                    success: false,
                    error: Some("unit not loaded".into()),
                    allocations: Vec::new(),
                });
                continue;
            };
            let result = match unit.classify(shift) {
                Ok(result) => {
                    self.log_execution(rule.id, shift, &result).await?;
                    RuleTestResult {
                        rule_id: rule.id,
                        rule_statement: rule.rule_statement.clone(),
                        function_name: rule.function_name.clone(),
                        success: true,
                        error: None,
                        allocations: result.allocations,
                    }
                }
                Err(e) => RuleTestResult {
                    rule_id: rule.id,
                    rule_statement: rule.rule_statement.clone(),
                    function_name: rule.function_name.clone(),
                    success: false,
                    error: Some(e.to_string()),
                    allocations: Vec::new(),
                },
            };
            rule_results.push(result);
        }

        let (combined_allocations, conflicts) = combine_allocations(&rule_results);
        let used_default = combined_allocations.is_empty();
        let combined = if used_default {
            default_classification(shift)
        } else {
            ShiftClassificationResult {
                employee_name: shift.employee_name.clone(),
                shift_start: shift.start,
                shift_end: shift.end,
                allocations: combined_allocations,
            }
        };

        debug!(
            rules = rule_results.len(),
            conflicts = conflicts.len(),
            used_default,
            "orchestration complete"
        );
        Ok(RuleOrchestrationResult {
            employee_name: shift.employee_name.clone(),
            rule_results,
            conflicts,
            combined,
            used_default,
        })
    }

    /// Orchestrate a batch of shifts, preserving input order.
    pub async fn test_all_rules_batch(
        &self,
        shifts: &[Shift],
    ) -> ClassifyResult<Vec<RuleOrchestrationResult>> {
        let mut results = Vec::with_capacity(shifts.len());
        for shift in shifts {
            results.push(self.test_all_rules(shift).await?);
        }
        Ok(results)
    }

    async fn log_execution(
        &self,
        rule_id: RuleId,
        shift: &Shift,
        result: &ShiftClassificationResult,
    ) -> ClassifyResult<()> {
        let result_json = serde_json::to_string(result)
            .map_err(|e| ClassifyError::ResultSerialization(e.to_string()))?;
        self.executions
            .record(RuleExecution::new(
                rule_id,
                shift.employee_name.clone(),
                shift.start,
                shift.end,
                result_json,
            ))
            .await?;
        Ok(())
    }
}

/// Merge per-rule allocations by pay code.
///
/// When several rules allocate to the same pay code, the allocation with
/// the greatest hours wins; ties keep the earlier rule. Pay codes keep
/// first-appearance order.
fn combine_allocations(
    rule_results: &[RuleTestResult],
) -> (Vec<PayCodeAllocation>, Vec<RuleConflict>) {
    let mut groups: Vec<(String, Vec<(&RuleTestResult, &PayCodeAllocation)>)> = Vec::new();
    for result in rule_results {
        for allocation in &result.allocations {
            match groups.iter_mut().find(|(code, _)| *code == allocation.pay_code) {
                Some((_, members)) => members.push((result, allocation)),
                None => groups.push((allocation.pay_code.clone(), vec![(result, allocation)])),
            }
        }
    }

    let mut combined = Vec::with_capacity(groups.len());
    let mut conflicts = Vec::new();
    for (pay_code, members) in groups {
        if members.len() == 1 {
            combined.push(members[0].1.clone());
            continue;
        }
        // Strictly-greater comparison so equal hours keep the earlier
        // rule in creation order.
        let (winner_rule, winner) = members
            .iter()
            .copied()
            .fold(members[0], |best, candidate| {
                if candidate.1.hours > best.1.hours {
                    candidate
                } else {
                    best
                }
            });
        let mut resolved = winner.clone();
        resolved.description =
            format!("{} (resolved from {} conflicts)", winner.description, members.len());
        conflicts.push(RuleConflict {
            pay_code,
            claims: members
                .iter()
                .map(|(rule, allocation)| ConflictClaim {
                    rule_id: rule.rule_id,
                    rule_statement: rule.rule_statement.clone(),
                    function_name: rule.function_name.clone(),
                    hours: allocation.hours,
                    description: allocation.description.clone(),
                })
                .collect(),
            winner_function: winner_rule.function_name.clone(),
            winning_hours: winner.hours,
        });
        combined.push(resolved);
    }
    (combined, conflicts)
}
