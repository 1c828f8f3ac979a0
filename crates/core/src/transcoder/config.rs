//! Configuration for the transcoder module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the FFmpeg-based transcoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscoderConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Container format pushed to the sink.
    #[serde(default = "default_output_format")]
    pub output_format: String,

    /// User-Agent header sent when reading remote inputs.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub ffmpeg_log_level: String,

    /// Additional global ffmpeg arguments, inserted before the output.
    #[serde(default)]
    pub extra_ffmpeg_args: Vec<String>,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_output_format() -> String {
    "flv".to_string()
}

fn default_user_agent() -> String {
    concat!("restreamer/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_log_level() -> String {
    "warning".to_string()
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            output_format: default_output_format(),
            user_agent: default_user_agent(),
            ffmpeg_log_level: default_log_level(),
            extra_ffmpeg_args: Vec::new(),
        }
    }
}

impl TranscoderConfig {
    /// Creates a new config with a custom ffmpeg path.
    pub fn with_ffmpeg_path(ffmpeg_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TranscoderConfig::default();
        assert_eq!(config.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert_eq!(config.output_format, "flv");
        assert_eq!(config.ffmpeg_log_level, "warning");
        assert!(config.user_agent.starts_with("restreamer/"));
    }

    #[test]
    fn test_deserialize_partial() {
        let toml = r#"
            ffmpeg_path = "/usr/local/bin/ffmpeg"
        "#;
        let config: TranscoderConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.ffmpeg_path, PathBuf::from("/usr/local/bin/ffmpeg"));
        assert_eq!(config.output_format, "flv");
        assert!(config.extra_ffmpeg_args.is_empty());
    }
}
