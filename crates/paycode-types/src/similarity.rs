//! Similarity search result shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{OrganizationId, RuleId};

/// One similar-rule hit returned by the vector similarity capability.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleSimilarity {
    pub rule_id: RuleId,
    pub rule_statement: String,
    pub rule_description: String,
    /// Cosine-style similarity score in `[0, 1]`.
    pub score: f64,
    pub organization_id: OrganizationId,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}
