//! Types for the extractor module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::channel::MediaRef;

/// A source resolved to something ffmpeg or an HTTP client can read directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedStream {
    pub title: String,
    pub playable_url: String,
}

/// Configuration for the yt-dlp based extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Path to the yt-dlp binary.
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: PathBuf,
    /// Timeout for a single extraction in seconds (default: 60)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_ytdlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_timeout() -> u64 {
    60
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: default_ytdlp_path(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Errors that can occur while resolving a source.
#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("yt-dlp not found at path: {path}")]
    ToolNotFound { path: PathBuf },

    #[error("Extraction failed for {source_url}: {reason}")]
    ExtractionFailed { source_url: String, reason: String },

    #[error("No suitable encoding for {0}")]
    NoSuitableFormat(String),

    #[error("Failed to parse extractor output: {0}")]
    ParseError(String),

    #[error("Extraction timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Converts a source URL into a directly fetchable media URL.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Resolve `source` to its title and a playable URL.
    async fn resolve_stream_url(&self, source: &MediaRef)
        -> Result<ResolvedStream, ExtractorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExtractorConfig::default();
        assert_eq!(config.ytdlp_path, PathBuf::from("yt-dlp"));
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_error_display() {
        let err = ExtractorError::NoSuitableFormat("https://youtube.com/watch?v=x".to_string());
        assert_eq!(
            err.to_string(),
            "No suitable encoding for https://youtube.com/watch?v=x"
        );
    }
}
