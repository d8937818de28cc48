//! Identifier newtypes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Rule identifier ────────────────────────────────────────────────────

/// Unique identifier shared by a generation request and the pay rule it
/// is promoted into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleId(pub Uuid);

impl RuleId {
    /// Generate a new unique rule ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Compact hex form without hyphens, used in derived unit names.
    pub fn simple(&self) -> String {
        self.0.simple().to_string()
    }
}

impl Default for RuleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rule:{}", self.0)
    }
}

// ── Organization identifier ────────────────────────────────────────────

/// Organization scope attached to rules, requests, and shifts.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrganizationId(pub String);

impl OrganizationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
