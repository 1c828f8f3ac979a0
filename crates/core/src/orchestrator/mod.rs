//! Stream orchestrator.
//!
//! Bootstraps channels from the control plane and keeps them on air:
//! - **Playback**: one cycling loop per channel, pushing entries to its sink
//! - **Download**: one-shot cache fills for non-auto channels
//! - **Refresh**: periodic rebuilds of updated auto channels
//!
//! All tasks share one shutdown signal and one join barrier.

mod config;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::{Collaborators, Orchestrator};
pub use types::{OrchestratorError, OrchestratorStatus};
