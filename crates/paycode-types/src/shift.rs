//! Shift input value.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::OrganizationId;

/// One worked shift, constructed per classification request.
///
/// Ephemeral: shifts are not persisted as their own entity, only via the
/// rule execution log.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Shift {
    /// Name of the employee who worked the shift.
    pub employee_name: String,
    /// Shift start instant.
    pub start: DateTime<Utc>,
    /// Shift end instant.
    pub end: DateTime<Utc>,
    /// Organization the shift belongs to.
    pub organization_id: OrganizationId,
}

impl Shift {
    pub fn new(
        employee_name: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        organization_id: OrganizationId,
    ) -> Self {
        Self {
            employee_name: employee_name.into(),
            start,
            end,
            organization_id,
        }
    }

    /// Shift duration in fractional hours.
    pub fn duration_hours(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64 / 3600.0
    }

    /// Hour-of-day of the start instant, with minute fraction.
    pub fn start_hour(&self) -> f64 {
        f64::from(self.start.hour()) + f64::from(self.start.minute()) / 60.0
    }

    /// Hour-of-day of the end instant, with minute fraction.
    pub fn end_hour(&self) -> f64 {
        f64::from(self.end.hour()) + f64::from(self.end.minute()) / 60.0
    }

    /// Weekday of the start instant, Monday = 0 through Sunday = 6.
    pub fn weekday(&self) -> f64 {
        f64::from(self.start.weekday().num_days_from_monday())
    }

    /// Whether the shift starts on a Saturday or Sunday.
    pub fn is_weekend(&self) -> bool {
        self.weekday() >= 5.0
    }
}
