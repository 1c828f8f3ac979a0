//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Tuning of the orchestrator's tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// First wait of a playback loop whose playlist is empty (milliseconds).
    /// A replacement with a non-empty playlist wakes the loop earlier.
    #[serde(default = "default_empty_backoff")]
    pub empty_playlist_backoff_ms: u64,

    /// Cap of the doubling empty-playlist wait (milliseconds).
    #[serde(default = "default_max_empty_backoff")]
    pub max_empty_playlist_backoff_ms: u64,

    /// How long shutdown waits for tasks before aborting them (seconds).
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

fn default_empty_backoff() -> u64 {
    1000
}

fn default_max_empty_backoff() -> u64 {
    30_000
}

fn default_shutdown_grace() -> u64 {
    2
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            empty_playlist_backoff_ms: default_empty_backoff(),
            max_empty_playlist_backoff_ms: default_max_empty_backoff(),
            shutdown_grace_secs: default_shutdown_grace(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.empty_playlist_backoff_ms, 1000);
        assert_eq!(config.max_empty_playlist_backoff_ms, 30_000);
        assert_eq!(config.shutdown_grace_secs, 2);
    }

    #[test]
    fn test_deserialize_partial() {
        let toml = r#"
            shutdown_grace_secs = 10
        "#;
        let config: OrchestratorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.shutdown_grace_secs, 10);
        assert_eq!(config.empty_playlist_backoff_ms, 1000);
    }
}
