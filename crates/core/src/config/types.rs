use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::extractor::ExtractorConfig;
use crate::orchestrator::OrchestratorConfig;
use crate::transcoder::TranscoderConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub search: SearchConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub control_plane: ControlPlaneConfig,
    #[serde(default)]
    pub streaming: StreamingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub transcoder: TranscoderConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

/// Control surface bind address
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Where channel specs are fetched from at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ControlPlaneConfig {
    /// Base URL of the web UI exposing `/api/streams/`.
    #[serde(default = "default_control_plane_url")]
    pub url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for ControlPlaneConfig {
    fn default() -> Self {
        Self {
            url: default_control_plane_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_control_plane_url() -> String {
    "http://localhost:8000".to_string()
}

/// Output sink configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamingConfig {
    /// When set, no playback loop is ever started (cache-only mode).
    #[serde(default)]
    pub disabled: bool,
    /// Sink root; a channel streams to `{sink_root_url}/{slug}`.
    #[serde(default = "default_sink_root_url")]
    pub sink_root_url: String,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            sink_root_url: default_sink_root_url(),
        }
    }
}

impl StreamingConfig {
    pub fn sink_url(&self, slug: &str) -> String {
        format!("{}/{}", self.sink_root_url.trim_end_matches('/'), slug)
    }
}

fn default_sink_root_url() -> String {
    "rtmp://localhost/hls".to_string()
}

/// Local media cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,
    /// Transfer-rate ceiling for cache downloads, in KiB per second.
    #[serde(default = "default_download_limit")]
    pub download_limit_kbps: u64,
    #[serde(default = "default_cache_extension")]
    pub cache_extension: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
            download_limit_kbps: default_download_limit(),
            cache_extension: default_cache_extension(),
        }
    }
}

impl StorageConfig {
    pub fn max_bytes_per_second(&self) -> u64 {
        self.download_limit_kbps * 1024
    }
}

fn default_root_path() -> PathBuf {
    PathBuf::from("./storage")
}

fn default_download_limit() -> u64 {
    100
}

fn default_cache_extension() -> String {
    "mp4".to_string()
}

/// Search backend configuration (YouTube Data API v3)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    pub api_key: String,
    #[serde(default = "default_search_base_url")]
    pub base_url: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_search_base_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

fn default_max_results() -> u32 {
    50
}

fn default_timeout() -> u32 {
    30
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub control_plane: ControlPlaneConfig,
    pub streaming: StreamingConfig,
    pub storage: StorageConfig,
    pub search: SanitizedSearchConfig,
    pub transcoder: TranscoderConfig,
    pub extractor: ExtractorConfig,
    pub orchestrator: OrchestratorConfig,
}

/// Sanitized search config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSearchConfig {
    pub base_url: String,
    pub api_key_configured: bool,
    pub max_results: u32,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            control_plane: config.control_plane.clone(),
            streaming: config.streaming.clone(),
            storage: config.storage.clone(),
            search: SanitizedSearchConfig {
                base_url: config.search.base_url.clone(),
                api_key_configured: !config.search.api_key.is_empty(),
                max_results: config.search.max_results,
                timeout_secs: config.search.timeout_secs,
            },
            transcoder: config.transcoder.clone(),
            extractor: config.extractor.clone(),
            orchestrator: config.orchestrator.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_config() {
        let toml = r#"
[search]
api_key = "key"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.control_plane.url, "http://localhost:8000");
        assert_eq!(config.streaming.sink_root_url, "rtmp://localhost/hls");
        assert!(!config.streaming.disabled);
        assert_eq!(config.storage.root_path, PathBuf::from("./storage"));
        assert_eq!(config.storage.download_limit_kbps, 100);
        assert_eq!(config.search.max_results, 50);
    }

    #[test]
    fn test_deserialize_missing_search_fails() {
        let toml = r#"
[server]
port = 8080
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[search]
api_key = "key"
max_results = 25

[server]
host = "127.0.0.1"
port = 9000

[control_plane]
url = "http://webui:8000"

[streaming]
disabled = true
sink_root_url = "rtmp://media/live"

[storage]
root_path = "/var/cache/restreamer"
download_limit_kbps = 512
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.control_plane.url, "http://webui:8000");
        assert!(config.streaming.disabled);
        assert_eq!(config.streaming.sink_root_url, "rtmp://media/live");
        assert_eq!(
            config.storage.root_path,
            PathBuf::from("/var/cache/restreamer")
        );
        assert_eq!(config.storage.max_bytes_per_second(), 512 * 1024);
        assert_eq!(config.search.max_results, 25);
    }

    #[test]
    fn test_sink_url() {
        let streaming = StreamingConfig {
            disabled: false,
            sink_root_url: "rtmp://localhost/hls/".to_string(),
        };
        assert_eq!(streaming.sink_url("news"), "rtmp://localhost/hls/news");
    }

    #[test]
    fn test_sanitized_config_hides_api_key() {
        let toml = r#"
[search]
api_key = "super-secret"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.search.api_key_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("super-secret"));
    }
}
