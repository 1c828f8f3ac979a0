use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Search API key is set
/// - Download limit is not 0
/// - Sink root URL is set
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.search.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "search.api_key must be set".to_string(),
        ));
    }

    if config.storage.download_limit_kbps == 0 {
        return Err(ConfigError::ValidationError(
            "storage.download_limit_kbps cannot be 0".to_string(),
        ));
    }

    if config.streaming.sink_root_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "streaming.sink_root_url must be set".to_string(),
        ));
    }

    Ok(())
}
