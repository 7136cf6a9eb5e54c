//! The Hearsay narrative engine.
//!
//! Drives stories through the phase graph: the periodic sweep evaluates
//! eligibility and executes transitions, interaction recording feeds the
//! early-transition counter, and the spawner keeps a configured number of
//! threads alive. All writes to a story's phase state go through a
//! per-story exclusive lock plus the store's revision guard.

pub mod engine;
pub mod error;
pub mod locks;
pub mod scheduler;
pub mod spawner;

pub use engine::{Engine, SweepSummary, TransitionOutcome};
pub use error::{Error, Result};
pub use spawner::StorySpawner;

#[cfg(test)]
mod tests;
