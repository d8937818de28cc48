//! Loaded unit handles.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use paycode_dsl::CompiledArtifact;
use paycode_types::{ExecutionError, PayrollClassifier, Shift, ShiftClassificationResult};
use tracing::debug;

use crate::error::{RegistryError, RegistryResult};

/// One loaded, executable rule unit.
///
/// The unit owns its program outright and shares nothing with other
/// units; dropping the last handle tears the unit down completely.
pub struct LoadedUnit {
    name: String,
    program: Box<dyn PayrollClassifier>,
    loaded_at: DateTime<Utc>,
}

impl LoadedUnit {
    /// Instantiate a unit from a compiled artifact.
    pub(crate) fn from_artifact(artifact: &CompiledArtifact) -> RegistryResult<Self> {
        let program = artifact
            .instantiate()
            .map_err(|e| RegistryError::LoadFailed {
                unit_name: artifact.unit_name.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            name: artifact.unit_name.clone(),
            program: Box::new(program),
            loaded_at: Utc::now(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Run the unit against one shift.
    pub fn classify(&self, shift: &Shift) -> Result<ShiftClassificationResult, ExecutionError> {
        self.program.calculate_payroll(shift)
    }
}

impl std::fmt::Debug for LoadedUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedUnit")
            .field("name", &self.name)
            .field("loaded_at", &self.loaded_at)
            .finish()
    }
}

/// A private unit living outside the long-lived registry, torn down
/// when dropped. Used for dry-run testing of rules that are not (or no
/// longer) registered.
pub struct EphemeralUnit {
    unit: Arc<LoadedUnit>,
}

impl EphemeralUnit {
    pub(crate) fn new(unit: Arc<LoadedUnit>) -> Self {
        Self { unit }
    }

    pub fn name(&self) -> &str {
        self.unit.name()
    }

    /// Run the temporary unit against one shift.
    pub fn classify(&self, shift: &Shift) -> Result<ShiftClassificationResult, ExecutionError> {
        self.unit.classify(shift)
    }
}

impl Drop for EphemeralUnit {
    fn drop(&mut self) {
        debug!(unit = self.unit.name(), "ephemeral unit torn down");
    }
}
