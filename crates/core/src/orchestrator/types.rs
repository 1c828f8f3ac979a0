//! Types for the orchestrator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::channel::ChannelId;
use crate::curator::CuratorError;
use crate::error::ExternalProcessError;
use crate::provider::ProviderError;

/// Errors that can occur during orchestration.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Channel specs could not be fetched.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Update for an id that was never registered.
    #[error("channel not found: {0}")]
    ChannelNotFound(ChannelId),

    /// An external helper is unusable.
    #[error("external process error: {0}")]
    ExternalProcess(#[from] ExternalProcessError),

    /// Input rejected before any task was created.
    #[error("validation error: {0}")]
    Validation(String),

    /// An auto spec produced no playlist.
    #[error("empty playlist for channel {0}")]
    EmptyPlaylist(ChannelId),
}

impl From<CuratorError> for OrchestratorError {
    fn from(err: CuratorError) -> Self {
        match err {
            CuratorError::EmptyPlaylist(id) => Self::EmptyPlaylist(id),
            CuratorError::InvalidFrequency { .. } => Self::Validation(err.to_string()),
        }
    }
}

/// Current status of the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    /// Whether shutdown has not been signalled yet.
    pub running: bool,
    /// Registered channels.
    pub channels: usize,
    /// Channels with a playback loop.
    pub playing: usize,
    /// Auto channels with an armed refresh task.
    pub refreshing: usize,
    /// Supervised tasks not yet joined.
    pub tasks: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curator_error_mapping() {
        let err: OrchestratorError = CuratorError::EmptyPlaylist(3).into();
        assert!(matches!(err, OrchestratorError::EmptyPlaylist(3)));

        let err: OrchestratorError = CuratorError::InvalidFrequency { id: 3, secs: -1 }.into();
        match err {
            OrchestratorError::Validation(msg) => assert!(msg.contains("-1")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_status_default() {
        let status = OrchestratorStatus::default();
        assert!(!status.running);
        assert_eq!(status.channels, 0);
    }
}
