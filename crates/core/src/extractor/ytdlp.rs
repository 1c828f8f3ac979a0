//! yt-dlp based extractor.

use async_trait::async_trait;
use serde::Deserialize;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::format::{select_best_format, MediaFormat};
use super::types::{Extractor, ExtractorConfig, ExtractorError, ResolvedStream};
use crate::channel::MediaRef;

/// Resolves sources by running `yt-dlp -J` and picking an encoding.
pub struct YtDlpExtractor {
    config: ExtractorConfig,
}

#[derive(Debug, Deserialize)]
struct VideoInfo {
    #[serde(default)]
    title: String,
    #[serde(default)]
    formats: Vec<MediaFormat>,
}

impl YtDlpExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(ExtractorConfig::default())
    }

    /// Parses `yt-dlp -J` output and selects an encoding.
    fn parse_info(source: &MediaRef, output: &str) -> Result<ResolvedStream, ExtractorError> {
        let info: VideoInfo = serde_json::from_str(output)
            .map_err(|e| ExtractorError::ParseError(format!("Invalid yt-dlp JSON: {}", e)))?;

        let format = select_best_format(&info.formats)
            .ok_or_else(|| ExtractorError::NoSuitableFormat(source.to_string()))?;

        debug!(
            "Selected format {} ({:?}p, {} kbps audio) for {}",
            format.format_id,
            format.resolution(),
            format.audio_bitrate(),
            source
        );

        Ok(ResolvedStream {
            title: info.title,
            playable_url: format.url.clone(),
        })
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn resolve_stream_url(
        &self,
        source: &MediaRef,
    ) -> Result<ResolvedStream, ExtractorError> {
        let command = Command::new(&self.config.ytdlp_path)
            .args(["-J", "--no-playlist", "--no-warnings"])
            .arg(source.as_str())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = timeout(Duration::from_secs(self.config.timeout_secs), command)
            .await
            .map_err(|_| ExtractorError::Timeout {
                timeout_secs: self.config.timeout_secs,
            })?
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ExtractorError::ToolNotFound {
                        path: self.config.ytdlp_path.clone(),
                    }
                } else {
                    ExtractorError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(ExtractorError::ExtractionFailed {
                source_url: source.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Self::parse_info(source, &String::from_utf8_lossy(&output.stdout))
    }
}
