//! First-match shift classifier.

use std::sync::Arc;

use paycode_dsl::RuleCompiler;
use paycode_registry::UnitRegistry;
use paycode_store::{PayRuleRepository, RuleExecutionRepository};
use paycode_types::{
    PayCodeAllocation, RuleExecution, RuleId, Shift, ShiftClassificationResult,
};
use tracing::{debug, warn};

use crate::error::{ClassifyError, ClassifyResult};

/// Pay code used when no rule claims a shift.
const DEFAULT_PAY_CODE: &str = "Regular";
const DEFAULT_DESCRIPTION: &str = "Regular working hours (default rule)";

/// Outcome of a dry run of uncommitted rule logic against one shift.
#[derive(Debug)]
pub enum RuleTestOutcome {
    /// The logic compiled and classified the shift.
    Classified(ShiftClassificationResult),
    /// The logic did not compile.
    CompileFailed { errors: String },
    /// The logic compiled but faulted at runtime.
    ExecutionFailed { error: String },
}

/// Classifies shifts by running active rules in creation order and
/// taking the first that executes without a fault.
pub struct ShiftClassifier {
    rules: Arc<dyn PayRuleRepository>,
    executions: Arc<dyn RuleExecutionRepository>,
    registry: Arc<UnitRegistry>,
    compiler: RuleCompiler,
}

impl ShiftClassifier {
    pub fn new(
        rules: Arc<dyn PayRuleRepository>,
        executions: Arc<dyn RuleExecutionRepository>,
        registry: Arc<UnitRegistry>,
    ) -> Self {
        Self {
            rules,
            executions,
            registry,
            compiler: RuleCompiler::new(),
        }
    }

    /// Classify one shift.
    ///
    /// Rules run in creation order; the first rule that executes without
    /// a fault wins, its result is returned as-is, and the invocation is
    /// logged to the execution trail. An empty allocation list is still
    /// a win. Rules that fault at runtime or whose unit is missing are
    /// skipped. Only when no rule executes successfully does every
    /// worked hour land on the default Regular allocation.
    pub async fn classify(&self, shift: &Shift) -> ClassifyResult<ShiftClassificationResult> {
        self.registry
            .preload_organization(&shift.organization_id)
            .await?;

        let rules = self.rules.list_active(&shift.organization_id).await?;
        for rule in &rules {
            let Some(unit) = self.registry.get(&rule.function_name) else {
                warn!(unit = %rule.function_name, "active rule has no loaded unit, skipping");
                continue;
            };
            match unit.classify(shift) {
                Ok(result) => {
                    debug!(rule = %rule.id, unit = %rule.function_name, "rule classified shift");
                    self.log_execution(rule.id, shift, &result).await?;
                    return Ok(result);
                }
                Err(e) => {
                    warn!(
                        rule = %rule.id,
                        unit = %rule.function_name,
                        error = %e,
                        "rule execution faulted, skipping"
                    );
                }
            }
        }

        Ok(default_classification(shift))
    }

    /// Classify a batch of shifts, preserving input order.
    pub async fn classify_batch(
        &self,
        shifts: &[Shift],
    ) -> ClassifyResult<Vec<ShiftClassificationResult>> {
        let mut results = Vec::with_capacity(shifts.len());
        for shift in shifts {
            results.push(self.classify(shift).await?);
        }
        Ok(results)
    }

    /// Run one specific rule against a shift regardless of its active
    /// state. Uses the already-loaded unit when present; otherwise the
    /// rule's stored logic is compiled into an ephemeral unit that is
    /// torn down when the call returns. Successful invocations are
    /// logged to the execution trail either way.
    pub async fn test_rule(
        &self,
        rule_id: &RuleId,
        shift: &Shift,
    ) -> ClassifyResult<RuleTestOutcome> {
        let rule = self
            .rules
            .get(rule_id)
            .await?
            .ok_or(ClassifyError::RuleNotFound(*rule_id))?;

        if let Some(unit) = self.registry.get(&rule.function_name) {
            return Ok(match unit.classify(shift) {
                Ok(result) => {
                    self.log_execution(rule.id, shift, &result).await?;
                    RuleTestOutcome::Classified(result)
                }
                Err(e) => RuleTestOutcome::ExecutionFailed { error: e.to_string() },
            });
        }
        let outcome = self
            .test_code(&rule.generated_code, &rule.function_name, shift)
            .await?;
        if let RuleTestOutcome::Classified(result) = &outcome {
            self.log_execution(rule.id, shift, result).await?;
        }
        Ok(outcome)
    }

    /// Dry-run uncommitted rule logic against one shift without touching
    /// stored rules. The logic is compiled and loaded under a throwaway
    /// unit name that never enters the long-lived registry.
    pub async fn test_code(
        &self,
        logic: &str,
        function_name: &str,
        shift: &Shift,
    ) -> ClassifyResult<RuleTestOutcome> {
        let temp_name = format!("test_{}_{}", function_name, RuleId::new().simple());
        let result = self.compiler.compile(logic, &temp_name);
        let Some(artifact) = result.artifact else {
            return Ok(RuleTestOutcome::CompileFailed {
                errors: result.error_text(),
            });
        };

        let unit = self.registry.load_ephemeral(&artifact)?;
        let outcome = match unit.classify(shift) {
            Ok(result) => RuleTestOutcome::Classified(result),
            Err(e) => RuleTestOutcome::ExecutionFailed {
                error: e.to_string(),
            },
        };
        Ok(outcome)
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

/// The allocation a shift receives when no rule claims it.
pub(crate) fn default_classification(shift: &Shift) -> ShiftClassificationResult {
    ShiftClassificationResult {
        employee_name: shift.employee_name.clone(),
        shift_start: shift.start,
        shift_end: shift.end,
        allocations: vec![PayCodeAllocation::new(
            DEFAULT_PAY_CODE,
            shift.duration_hours(),
            DEFAULT_DESCRIPTION,
        )],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use paycode_store::{InMemoryExecutionStore, InMemoryRuleStore};
    use paycode_types::{OrganizationId, PayRule};

    struct Fixture {
        classifier: ShiftClassifier,
        rules: Arc<InMemoryRuleStore>,
        executions: Arc<InMemoryExecutionStore>,
        registry: Arc<UnitRegistry>,
    }

    fn fixture() -> Fixture {
        let rules = Arc::new(InMemoryRuleStore::new());
        let executions = Arc::new(InMemoryExecutionStore::new());
        let registry = Arc::new(UnitRegistry::new(rules.clone()));
        let classifier = ShiftClassifier::new(rules.clone(), executions.clone(), registry.clone());
        Fixture { classifier, rules, executions, registry }
    }

    async fn add_rule(f: &Fixture, name: &str, logic: &str) -> RuleId {
        let rule = PayRule::new(
            RuleId::new(),
            format!("statement for {name}"),
            "description",
            name,
            logic,
            OrganizationId::new("org-1"),
            "alice",
        );
        let id = rule.id;
        f.rules.add(rule).await.unwrap();
        id
    }

    fn shift(start_hour: u32, end_hour: u32) -> Shift {
        // 2026-03-02 is a Monday.
        Shift::new(
            "Alice",
            Utc.with_ymd_and_hms(2026, 3, 2, start_hour, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 2, end_hour, 0, 0).unwrap(),
            OrganizationId::new("org-1"),
        )
    }

    const OVERTIME_RULE: &str = "let total = shift.total_hours;\n\
        if total > 8 {\n\
            allocate \"Regular\" 8 \"Regular hours up to 8\";\n\
            allocate \"Overtime\" total - 8 \"Overtime beyond 8 hours\";\n\
        } else {\n\
            allocate \"Regular\" total \"Regular working hours\";\n\
        }";

    #[tokio::test]
    async fn overtime_rule_splits_ten_hour_shift() {
        let f = fixture();
        add_rule(&f, "rule_overtime", OVERTIME_RULE).await;

        let result = f.classifier.classify(&shift(8, 18)).await.unwrap();
        assert_eq!(result.allocation("Regular").unwrap().hours, 8.0);
        assert_eq!(result.allocation("Overtime").unwrap().hours, 2.0);
        assert_eq!(result.total_hours(), 10.0);
    }

    #[tokio::test]
    async fn first_matching_rule_wins() {
        let f = fixture();
        // Both rules would match; creation order decides.
        add_rule(&f, "rule_first", "allocate \"First\" shift.total_hours;").await;
        add_rule(&f, "rule_second", "allocate \"Second\" shift.total_hours;").await;

        let result = f.classifier.classify(&shift(8, 16)).await.unwrap();
        assert!(result.allocation("First").is_some());
        assert!(result.allocation("Second").is_none());
    }

    #[tokio::test]
    async fn first_successful_rule_wins_even_when_empty() {
        let f = fixture();
        let weekend_id = add_rule(
            &f,
            "rule_weekend",
            "if shift.is_weekend { allocate \"Weekend\" shift.total_hours; }",
        )
        .await;
        add_rule(&f, "rule_all", "allocate \"Second\" shift.total_hours;").await;

        // Monday shift: the weekend rule executes cleanly with zero
        // allocations, and that empty result still wins over the later
        // catch-all rule.
        let result = f.classifier.classify(&shift(8, 16)).await.unwrap();
        assert!(result.allocations.is_empty());
        assert!(result.allocation("Second").is_none());

        // The empty win is a successful invocation and is logged.
        let log = f.executions.list_for_rule(&weekend_id).await.unwrap();
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn no_rules_fall_back_to_default() {
        let f = fixture();
        let result = f.classifier.classify(&shift(8, 16)).await.unwrap();
        assert_eq!(result.allocations.len(), 1);
        let allocation = &result.allocations[0];
        assert_eq!(allocation.pay_code, "Regular");
        assert_eq!(allocation.hours, 8.0);
        assert_eq!(allocation.description, "Regular working hours (default rule)");
    }

    #[tokio::test]
    async fn faulting_rule_is_skipped() {
        let f = fixture();
        add_rule(&f, "rule_bad", "allocate \"Broken\" 1 / 0;").await;
        add_rule(&f, "rule_good", "allocate \"Regular\" shift.total_hours;").await;

        let result = f.classifier.classify(&shift(8, 16)).await.unwrap();
        assert!(result.allocation("Regular").is_some());
    }

    #[tokio::test]
    async fn matched_execution_is_logged() {
        let f = fixture();
        let rule_id = add_rule(&f, "rule_a", "allocate \"Regular\" shift.total_hours;").await;

        f.classifier.classify(&shift(8, 16)).await.unwrap();
        let log = f.executions.list_for_rule(&rule_id).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].employee_name, "Alice");
        assert!(log[0].result_json.contains("Regular"));
    }

    #[tokio::test]
    async fn default_fallback_is_not_logged() {
        let f = fixture();
        let rule_id = add_rule(&f, "rule_bad", "allocate \"Broken\" 1 / 0;").await;

        let result = f.classifier.classify(&shift(8, 16)).await.unwrap();
        assert_eq!(result.allocations[0].pay_code, "Regular");
        assert!(f.executions.list_for_rule(&rule_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn classify_warms_the_organization_once() {
        let f = fixture();
        add_rule(&f, "rule_a", "allocate \"Regular\" shift.total_hours;").await;
        let org = OrganizationId::new("org-1");

        assert!(!f.registry.is_organization_warm(&org));
        f.classifier.classify(&shift(8, 16)).await.unwrap();
        assert!(f.registry.is_organization_warm(&org));
        assert!(f.registry.is_loaded("rule_a"));
    }

    #[tokio::test]
    async fn classify_batch_preserves_order() {
        let f = fixture();
        add_rule(&f, "rule_a", OVERTIME_RULE).await;
        let shifts = vec![shift(8, 18), shift(9, 13)];
        let results = f.classifier.classify_batch(&shifts).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].total_hours(), 10.0);
        assert_eq!(results[1].total_hours(), 4.0);
    }

    #[tokio::test]
    async fn test_code_leaves_no_unit_behind() {
        let f = fixture();
        let outcome = f
            .classifier
            .test_code(OVERTIME_RULE, "rule_candidate", &shift(8, 18))
            .await
            .unwrap();
        let RuleTestOutcome::Classified(result) = outcome else {
            panic!("expected classification, got {outcome:?}");
        };
        assert_eq!(result.allocation("Overtime").unwrap().hours, 2.0);
        assert_eq!(f.registry.loaded_count(), 0);
    }

    #[tokio::test]
    async fn test_code_reports_compile_failure() {
        let f = fixture();
        let outcome = f
            .classifier
            .test_code("allocate \"Regular\" ;", "rule_candidate", &shift(8, 16))
            .await
            .unwrap();
        assert!(matches!(outcome, RuleTestOutcome::CompileFailed { .. }));
    }

    #[tokio::test]
    async fn test_code_reports_runtime_fault() {
        let f = fixture();
        let outcome = f
            .classifier
            .test_code("allocate \"Regular\" 1 / 0;", "rule_candidate", &shift(8, 16))
            .await
            .unwrap();
        let RuleTestOutcome::ExecutionFailed { error } = outcome else {
            panic!("expected execution failure, got {outcome:?}");
        };
        assert!(error.contains("division by zero"));
        assert_eq!(f.registry.loaded_count(), 0);
    }

    #[tokio::test]
    async fn test_rule_runs_an_inactive_rule_ephemerally() {
        let f = fixture();
        let rule_id = add_rule(&f, "rule_inactive", OVERTIME_RULE).await;
        let mut rule = f.rules.get(&rule_id).await.unwrap().unwrap();
        rule.is_active = false;
        f.rules.update(rule).await.unwrap();

        let outcome = f.classifier.test_rule(&rule_id, &shift(8, 18)).await.unwrap();
        let RuleTestOutcome::Classified(result) = outcome else {
            panic!("expected classification, got {outcome:?}");
        };
        assert_eq!(result.allocation("Overtime").unwrap().hours, 2.0);
        // The inactive rule never entered the long-lived registry, but
        // the successful dry run is still on the execution trail.
        assert!(!f.registry.is_loaded("rule_inactive"));
        assert_eq!(f.executions.list_for_rule(&rule_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rule_unknown_id_is_an_error() {
        let f = fixture();
        let err = f
            .classifier
            .test_rule(&RuleId::new(), &shift(8, 16))
            .await
            .unwrap_err();
        assert!(matches!(err, ClassifyError::RuleNotFound(_)));
    }
}
