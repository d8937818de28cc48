//! Rule generation lifecycle.
//!
//! Drives a natural-language rule statement through intent extraction,
//! code generation, compilation, and activation into the unit registry,
//! with one bounded automated repair attempt on compile failure. Also
//! hosts the manual code update pipeline with its audit trail.
//!
//! Text generation and similarity search are capability traits; the
//! shipped [`ScriptedGenerator`] and [`SimilarityDisabled`] stand in
//! where no real provider is wired up.

#![deny(unsafe_code)]

mod capability;
mod engine;
mod error;
mod prompts;
mod update;

pub use capability::{ScriptedGenerator, SimilarityDisabled, SimilaritySearch, TextGenerator};
pub use engine::{ActivationOutcome, RuleLifecycle};
pub use error::{GenerationError, GenerationResult};
pub use update::{CodeUpdatePipeline, UpdateOutcome};
