//! In-memory repository implementations.
//!
//! Suitable for development and testing. Production deployments should
//! use persistent backends behind the same traits.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use paycode_types::{
    OrganizationId, PayRule, RuleCompilationAudit, RuleExecution, RuleGenerationRequest, RuleId,
};

use crate::error::{StoreError, StoreResult};
use crate::traits::{
    CompilationAuditRepository, GenerationRequestRepository, PayRuleRepository,
    RuleExecutionRepository,
};

/// In-memory pay rule store.
///
/// Insertion sequence numbers give listings a stable creation order even
/// when wall-clock timestamps collide.
pub struct InMemoryRuleStore {
    rules: DashMap<RuleId, (u64, PayRule)>,
    seq: AtomicU64,
}

impl InMemoryRuleStore {
    pub fn new() -> Self {
        Self {
            rules: DashMap::new(),
            seq: AtomicU64::new(0),
        }
    }

    fn sorted_for(
        &self,
        organization_id: &OrganizationId,
        mut keep: impl FnMut(&PayRule) -> bool,
    ) -> Vec<PayRule> {
        let mut rules: Vec<(u64, PayRule)> = self
            .rules
            .iter()
            .filter(|entry| entry.value().1.organization_id == *organization_id)
            .filter(|entry| keep(&entry.value().1))
            .map(|entry| entry.value().clone())
            .collect();
        rules.sort_by_key(|(seq, _)| *seq);
        rules.into_iter().map(|(_, rule)| rule).collect()
    }
}

impl Default for InMemoryRuleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PayRuleRepository for InMemoryRuleStore {
    async fn add(&self, rule: PayRule) -> StoreResult<()> {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.rules.insert(rule.id, (seq, rule));
        Ok(())
    }

    async fn get(&self, id: &RuleId) -> StoreResult<Option<PayRule>> {
        Ok(self.rules.get(id).map(|entry| entry.value().1.clone()))
    }

    async fn update(&self, rule: PayRule) -> StoreResult<()> {
        match self.rules.get_mut(&rule.id) {
            Some(mut entry) => {
                entry.value_mut().1 = rule;
                Ok(())
            }
            None => Err(StoreError::RuleNotFound(rule.id)),
        }
    }

    async fn list_active(&self, organization_id: &OrganizationId) -> StoreResult<Vec<PayRule>> {
        Ok(self.sorted_for(organization_id, |r| r.is_active))
    }

    async fn list_all(&self, organization_id: &OrganizationId) -> StoreResult<Vec<PayRule>> {
        Ok(self.sorted_for(organization_id, |_| true))
    }
}

/// In-memory generation request store.
pub struct InMemoryRequestStore {
    requests: DashMap<RuleId, (u64, RuleGenerationRequest)>,
    seq: AtomicU64,
}

impl InMemoryRequestStore {
    pub fn new() -> Self {
        Self {
            requests: DashMap::new(),
            seq: AtomicU64::new(0),
        }
    }

    fn sorted_for(
        &self,
        organization_id: &OrganizationId,
        mut keep: impl FnMut(&RuleGenerationRequest) -> bool,
    ) -> Vec<RuleGenerationRequest> {
        let mut requests: Vec<(u64, RuleGenerationRequest)> = self
            .requests
            .iter()
            .filter(|entry| entry.value().1.organization_id == *organization_id)
            .filter(|entry| keep(&entry.value().1))
            .map(|entry| entry.value().clone())
            .collect();
        requests.sort_by_key(|(seq, _)| *seq);
        requests.into_iter().map(|(_, request)| request).collect()
    }
}

impl Default for InMemoryRequestStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationRequestRepository for InMemoryRequestStore {
    async fn add(&self, request: RuleGenerationRequest) -> StoreResult<()> {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.requests.insert(request.id, (seq, request));
        Ok(())
    }

    async fn get(&self, id: &RuleId) -> StoreResult<Option<RuleGenerationRequest>> {
        Ok(self.requests.get(id).map(|entry| entry.value().1.clone()))
    }

    async fn update(&self, request: RuleGenerationRequest) -> StoreResult<()> {
        match self.requests.get_mut(&request.id) {
            Some(mut entry) => {
                entry.value_mut().1 = request;
                Ok(())
            }
            None => Err(StoreError::RequestNotFound(request.id)),
        }
    }

    async fn list(
        &self,
        organization_id: &OrganizationId,
    ) -> StoreResult<Vec<RuleGenerationRequest>> {
        Ok(self.sorted_for(organization_id, |_| true))
    }

    async fn list_with_errors(
        &self,
        organization_id: &OrganizationId,
    ) -> StoreResult<Vec<RuleGenerationRequest>> {
        Ok(self.sorted_for(organization_id, |r| r.compilation_errors.is_some()))
    }
}

/// In-memory compile audit store.
pub struct InMemoryAuditStore {
    rows: DashMap<RuleId, Vec<RuleCompilationAudit>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self { rows: DashMap::new() }
    }
}

impl Default for InMemoryAuditStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompilationAuditRepository for InMemoryAuditStore {
    async fn record(&self, audit: RuleCompilationAudit) -> StoreResult<()> {
        self.rows.entry(audit.rule_id).or_default().push(audit);
        Ok(())
    }

    async fn list_for_rule(&self, rule_id: &RuleId) -> StoreResult<Vec<RuleCompilationAudit>> {
        Ok(self
            .rows
            .get(rule_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }
}

/// In-memory rule execution log.
pub struct InMemoryExecutionStore {
    rows: DashMap<RuleId, Vec<RuleExecution>>,
}

impl InMemoryExecutionStore {
    pub fn new() -> Self {
        Self { rows: DashMap::new() }
    }
}

impl Default for InMemoryExecutionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RuleExecutionRepository for InMemoryExecutionStore {
    async fn record(&self, execution: RuleExecution) -> StoreResult<()> {
        self.rows
            .entry(execution.rule_id)
            .or_default()
            .push(execution);
        Ok(())
    }

    async fn list_for_rule(&self, rule_id: &RuleId) -> StoreResult<Vec<RuleExecution>> {
        Ok(self
            .rows
            .get(rule_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }
}
