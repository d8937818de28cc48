//! Loaded rule unit registry.
//!
//! Hosts one isolated, executable unit per unit name. Loading an
//! artifact under an existing name atomically replaces the previous
//! unit; in-flight callers holding the old handle finish against it,
//! and the old unit is torn down when the last handle drops. Unloading
//! removes executability without touching stored rule entities.
//!
//! Also owns the organization warm set: the first classification for an
//! organization bulk-loads its active rules, later ones skip the work.

#![deny(unsafe_code)]

mod error;
mod registry;
mod unit;

pub use error::{RegistryError, RegistryResult};
pub use registry::UnitRegistry;
pub use unit::{EphemeralUnit, LoadedUnit};
