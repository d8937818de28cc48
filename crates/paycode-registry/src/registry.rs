//! The unit registry and organization warm set.

use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use paycode_dsl::{CompiledArtifact, RuleCompiler};
use paycode_store::PayRuleRepository;
use paycode_types::OrganizationId;
use tracing::{debug, info, warn};

use crate::error::RegistryResult;
use crate::unit::{EphemeralUnit, LoadedUnit};

/// Concurrent registry of loaded rule units, keyed by unit name.
///
/// All operations take `&self`; the registry is shared behind an `Arc`
/// by the classifier, orchestrator, and lifecycle engine.
pub struct UnitRegistry {
    units: Arc<DashMap<String, Arc<LoadedUnit>>>,
    warm_orgs: DashSet<OrganizationId>,
    rules: Arc<dyn PayRuleRepository>,
    compiler: RuleCompiler,
}

impl UnitRegistry {
    pub fn new(rules: Arc<dyn PayRuleRepository>) -> Self {
        Self {
            units: Arc::new(DashMap::new()),
            warm_orgs: DashSet::new(),
            rules,
            compiler: RuleCompiler::new(),
        }
    }

    // ── Load / swap / unload ─────────────────────────────────────────

    /// Load an artifact under its unit name, replacing any previous unit
    /// with that name. Returns `true` when a previous unit was swapped
    /// out. In-flight callers holding the old handle are unaffected; the
    /// old unit is torn down when the last handle drops.
    pub fn load(&self, artifact: &CompiledArtifact) -> RegistryResult<bool> {
        let unit = Arc::new(LoadedUnit::from_artifact(artifact)?);
        let replaced = self.units.insert(artifact.unit_name.clone(), unit).is_some();
        if replaced {
            info!(unit = %artifact.unit_name, "unit replaced");
        } else {
            debug!(unit = %artifact.unit_name, "unit loaded");
        }
        Ok(replaced)
    }

    /// Handle to a loaded unit, if present.
    pub fn get(&self, unit_name: &str) -> Option<Arc<LoadedUnit>> {
        self.units.get(unit_name).map(|entry| entry.value().clone())
    }

    pub fn is_loaded(&self, unit_name: &str) -> bool {
        self.units.contains_key(unit_name)
    }

    /// Remove a unit. Returns `false` when no such unit was loaded;
    /// unloading an absent unit is not an error.
    pub fn unload(&self, unit_name: &str) -> bool {
        let removed = self.units.remove(unit_name).is_some();
        if removed {
            info!(unit = unit_name, "unit unloaded");
        }
        removed
    }

    pub fn loaded_count(&self) -> usize {
        self.units.len()
    }

    /// Load an artifact into a private unit that never enters the
    /// long-lived registry. The unit is torn down when the returned
    /// handle drops.
    pub fn load_ephemeral(&self, artifact: &CompiledArtifact) -> RegistryResult<EphemeralUnit> {
        let unit = Arc::new(LoadedUnit::from_artifact(artifact)?);
        debug!(unit = %artifact.unit_name, "ephemeral unit loaded");
        Ok(EphemeralUnit::new(unit))
    }

    /// Compile rule logic and load it as an ephemeral unit. `None` when
    /// the logic does not compile or the artifact fails to load; callers
    /// wanting diagnostics compile through [`RuleCompiler`] themselves.
    pub fn compile_and_load_ephemeral(
        &self,
        logic: &str,
        unit_name: &str,
    ) -> Option<EphemeralUnit> {
        let result = self.compiler.compile(logic, unit_name);
        let artifact = result.artifact?;
        match self.load_ephemeral(&artifact) {
            Ok(unit) => Some(unit),
            Err(e) => {
                warn!(unit = unit_name, error = %e, "ephemeral load failed");
                None
            }
        }
    }

    // ── Organization warm set ────────────────────────────────────────

    /// Bulk-load every active rule of an organization from storage.
    ///
    /// Individual rules whose stored source no longer compiles or whose
    /// artifact fails to load are skipped with a warning; one bad rule
    /// never blocks the rest. The organization is marked warm even when
    /// some rules were skipped. Warming an already-warm organization is
    /// a no-op.
    ///
    /// Returns `true` when the organization ended up warm: at least one
    /// rule loaded, or it has no active rules at all.
    pub async fn preload_organization(
        &self,
        organization_id: &OrganizationId,
    ) -> RegistryResult<bool> {
        if self.warm_orgs.contains(organization_id) {
            return Ok(true);
        }

        let rules = self.rules.list_active(organization_id).await?;
        let total = rules.len();
        let mut loaded = 0usize;

        for rule in &rules {
            let result = self.compiler.compile(&rule.generated_code, &rule.function_name);
            let Some(artifact) = result.artifact else {
                warn!(
                    unit = %rule.function_name,
                    org = %organization_id,
                    errors = %result.error_text(),
                    "skipping stored rule that no longer compiles"
                );
                continue;
            };
            match self.load(&artifact) {
                Ok(_) => loaded += 1,
                Err(e) => {
                    warn!(
                        unit = %rule.function_name,
                        org = %organization_id,
                        error = %e,
                        "skipping stored rule that failed to load"
                    );
                }
            }
        }

        self.warm_orgs.insert(organization_id.clone());
        info!(org = %organization_id, loaded, total, "organization preloaded");
        Ok(loaded > 0 || total == 0)
    }

    pub fn is_organization_warm(&self, organization_id: &OrganizationId) -> bool {
        self.warm_orgs.contains(organization_id)
    }

    /// Unload every active rule of an organization and clear its warm
    /// mark, so the next classification reloads from storage.
    pub async fn unload_organization(
        &self,
        organization_id: &OrganizationId,
    ) -> RegistryResult<usize> {
        let rules = self.rules.list_active(organization_id).await?;
        let mut unloaded = 0usize;
        for rule in &rules {
            if self.unload(&rule.function_name) {
                unloaded += 1;
            }
        }
        self.warm_orgs.remove(organization_id);
        info!(org = %organization_id, unloaded, "organization unloaded");
        Ok(unloaded)
    }

    /// Drop the warm mark without unloading units. The next
    /// classification re-runs the preload, picking up newly activated
    /// rules.
    pub fn invalidate_warm(&self, organization_id: &OrganizationId) {
        self.warm_orgs.remove(organization_id);
    }
}

impl std::fmt::Debug for UnitRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitRegistry")
            .field("loaded", &self.units.len())
            .field("warm_orgs", &self.warm_orgs.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use paycode_store::InMemoryRuleStore;
    use paycode_types::{OrganizationId, PayRule, RuleId, Shift};

    fn registry() -> (UnitRegistry, Arc<InMemoryRuleStore>) {
        let store = Arc::new(InMemoryRuleStore::new());
        (UnitRegistry::new(store.clone()), store)
    }

    fn artifact(logic: &str, unit_name: &str) -> CompiledArtifact {
        let result = RuleCompiler::new().compile(logic, unit_name);
        result.artifact.expect("logic should compile")
    }

    fn shift() -> Shift {
        Shift::new(
            "Alice",
            Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 2, 16, 0, 0).unwrap(),
            OrganizationId::new("org-1"),
        )
    }

    #[tokio::test]
    async fn load_and_classify() {
        let (registry, _) = registry();
        let replaced = registry
            .load(&artifact("allocate \"Regular\" shift.total_hours;", "rule_a"))
            .unwrap();
        assert!(!replaced);

        let unit = registry.get("rule_a").unwrap();
        let result = unit.classify(&shift()).unwrap();
        assert_eq!(result.total_hours(), 8.0);
    }

    #[tokio::test]
    async fn reload_replaces_previous_unit() {
        let (registry, _) = registry();
        registry
            .load(&artifact("allocate \"Regular\" 1;", "rule_a"))
            .unwrap();
        let replaced = registry
            .load(&artifact("allocate \"Regular\" 2;", "rule_a"))
            .unwrap();
        assert!(replaced);
        assert_eq!(registry.loaded_count(), 1);

        let result = registry.get("rule_a").unwrap().classify(&shift()).unwrap();
        assert_eq!(result.allocations[0].hours, 2.0);
    }

    #[tokio::test]
    async fn old_handle_survives_swap() {
        let (registry, _) = registry();
        registry
            .load(&artifact("allocate \"Regular\" 1;", "rule_a"))
            .unwrap();
        let old = registry.get("rule_a").unwrap();
        registry
            .load(&artifact("allocate \"Regular\" 2;", "rule_a"))
            .unwrap();

        // The in-flight handle still runs the old logic.
        assert_eq!(old.classify(&shift()).unwrap().allocations[0].hours, 1.0);
        let new = registry.get("rule_a").unwrap();
        assert_eq!(new.classify(&shift()).unwrap().allocations[0].hours, 2.0);
    }

    #[tokio::test]
    async fn unload_is_noop_safe() {
        let (registry, _) = registry();
        registry
            .load(&artifact("allocate \"Regular\" 1;", "rule_a"))
            .unwrap();
        assert!(registry.unload("rule_a"));
        assert!(!registry.unload("rule_a"));
        assert!(registry.get("rule_a").is_none());
    }

    #[tokio::test]
    async fn ephemeral_unit_stays_out_of_the_registry() {
        let (registry, _) = registry();
        let unit = registry
            .load_ephemeral(&artifact("allocate \"Regular\" 1;", "test_rule_tmp"))
            .unwrap();
        assert!(!registry.is_loaded("test_rule_tmp"));
        assert_eq!(registry.loaded_count(), 0);
        assert_eq!(unit.classify(&shift()).unwrap().allocations[0].hours, 1.0);
    }

    #[tokio::test]
    async fn compile_and_load_ephemeral_rejects_bad_logic() {
        let (registry, _) = registry();
        assert!(registry
            .compile_and_load_ephemeral("allocate \"Regular\" 1;", "test_ok")
            .is_some());
        assert!(registry
            .compile_and_load_ephemeral("allocate \"Regular\" ;", "test_bad")
            .is_none());
    }

    #[tokio::test]
    async fn preload_loads_active_rules_and_marks_warm() {
        let (registry, store) = registry();
        let org = OrganizationId::new("org-1");
        store
            .add(PayRule::new(
                RuleId::new(),
                "s",
                "d",
                "rule_a",
                "allocate \"Regular\" shift.total_hours;",
                org.clone(),
                "alice",
            ))
            .await
            .unwrap();

        assert!(!registry.is_organization_warm(&org));
        assert!(registry.preload_organization(&org).await.unwrap());
        assert!(registry.is_organization_warm(&org));
        assert!(registry.is_loaded("rule_a"));
    }

    #[tokio::test]
    async fn preload_skips_broken_rules() {
        let (registry, store) = registry();
        let org = OrganizationId::new("org-1");
        store
            .add(PayRule::new(
                RuleId::new(),
                "s",
                "d",
                "rule_bad",
                "allocate \"Regular\" nonsense syntax here",
                org.clone(),
                "alice",
            ))
            .await
            .unwrap();
        store
            .add(PayRule::new(
                RuleId::new(),
                "s",
                "d",
                "rule_good",
                "allocate \"Regular\" shift.total_hours;",
                org.clone(),
                "alice",
            ))
            .await
            .unwrap();

        assert!(registry.preload_organization(&org).await.unwrap());
        assert!(!registry.is_loaded("rule_bad"));
        assert!(registry.is_loaded("rule_good"));
    }

    #[tokio::test]
    async fn preload_empty_organization_is_warm() {
        let (registry, _) = registry();
        let org = OrganizationId::new("org-empty");
        assert!(registry.preload_organization(&org).await.unwrap());
        assert!(registry.is_organization_warm(&org));
    }

    #[tokio::test]
    async fn preload_is_idempotent() {
        let (registry, store) = registry();
        let org = OrganizationId::new("org-1");
        store
            .add(PayRule::new(
                RuleId::new(),
                "s",
                "d",
                "rule_a",
                "allocate \"Regular\" 1;",
                org.clone(),
                "alice",
            ))
            .await
            .unwrap();

        registry.preload_organization(&org).await.unwrap();
        registry.unload("rule_a");
        // Second call is a no-op while the warm mark stands.
        assert!(registry.preload_organization(&org).await.unwrap());
        assert!(!registry.is_loaded("rule_a"));
    }

    #[tokio::test]
    async fn unload_organization_clears_warm_mark() {
        let (registry, store) = registry();
        let org = OrganizationId::new("org-1");
        store
            .add(PayRule::new(
                RuleId::new(),
                "s",
                "d",
                "rule_a",
                "allocate \"Regular\" 1;",
                org.clone(),
                "alice",
            ))
            .await
            .unwrap();

        registry.preload_organization(&org).await.unwrap();
        let unloaded = registry.unload_organization(&org).await.unwrap();
        assert_eq!(unloaded, 1);
        assert!(!registry.is_organization_warm(&org));
        assert!(!registry.is_loaded("rule_a"));
    }
}
