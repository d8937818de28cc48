//! Repository traits.

use async_trait::async_trait;
use paycode_types::{
    OrganizationId, PayRule, RuleCompilationAudit, RuleExecution, RuleGenerationRequest, RuleId,
};

use crate::error::StoreResult;

/// Storage for activated pay rules.
#[async_trait]
pub trait PayRuleRepository: Send + Sync {
    async fn add(&self, rule: PayRule) -> StoreResult<()>;

    async fn get(&self, id: &RuleId) -> StoreResult<Option<PayRule>>;

    /// Replace an existing rule. Fails if the rule was never added.
    async fn update(&self, rule: PayRule) -> StoreResult<()>;

    /// Active rules for an organization, in creation order. Creation
    /// order is the classifier's evaluation order, so it must be stable.
    async fn list_active(&self, organization_id: &OrganizationId) -> StoreResult<Vec<PayRule>>;

    /// All rules for an organization regardless of active flag, in
    /// creation order.
    async fn list_all(&self, organization_id: &OrganizationId) -> StoreResult<Vec<PayRule>>;
}

/// Storage for rule generation requests.
///
/// Requests are never deleted; failed ones double as audit history.
#[async_trait]
pub trait GenerationRequestRepository: Send + Sync {
    async fn add(&self, request: RuleGenerationRequest) -> StoreResult<()>;

    async fn get(&self, id: &RuleId) -> StoreResult<Option<RuleGenerationRequest>>;

    /// Replace an existing request. Fails if the request was never added.
    async fn update(&self, request: RuleGenerationRequest) -> StoreResult<()>;

    /// All requests for an organization, in creation order.
    async fn list(&self, organization_id: &OrganizationId)
        -> StoreResult<Vec<RuleGenerationRequest>>;

    /// Requests whose last attempt recorded compilation errors.
    async fn list_with_errors(
        &self,
        organization_id: &OrganizationId,
    ) -> StoreResult<Vec<RuleGenerationRequest>>;
}

/// Append-only store for compile attempt audit rows.
#[async_trait]
pub trait CompilationAuditRepository: Send + Sync {
    async fn record(&self, audit: RuleCompilationAudit) -> StoreResult<()>;

    /// Audit rows for one rule, oldest first.
    async fn list_for_rule(&self, rule_id: &RuleId) -> StoreResult<Vec<RuleCompilationAudit>>;
}

/// Append-only store for the rule execution log.
#[async_trait]
pub trait RuleExecutionRepository: Send + Sync {
    async fn record(&self, execution: RuleExecution) -> StoreResult<()>;

    /// Executions for one rule, oldest first.
    async fn list_for_rule(&self, rule_id: &RuleId) -> StoreResult<Vec<RuleExecution>>;
}
