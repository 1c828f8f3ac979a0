//! FFmpeg-based transcoder implementation.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

use super::config::TranscoderConfig;
use super::error::TranscoderError;
use super::traits::Transcoder;

/// Real-time remux (`-re ... -c copy`) through an ffmpeg child process.
pub struct FfmpegTranscoder {
    config: TranscoderConfig,
}

impl FfmpegTranscoder {
    /// Creates a new FFmpeg transcoder with the given configuration.
    pub fn new(config: TranscoderConfig) -> Self {
        Self { config }
    }

    /// Creates a transcoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TranscoderConfig::default())
    }

    /// Builds ffmpeg arguments for a remote input.
    fn build_remote_args(&self, playable_url: &str, sink_url: &str) -> Vec<String> {
        let mut args = vec![
            "-re".to_string(),
            "-user_agent".to_string(),
            self.config.user_agent.clone(),
            "-i".to_string(),
            playable_url.to_string(),
        ];
        self.push_output_args(&mut args, sink_url);
        args
    }

    /// Builds ffmpeg arguments for a cached file.
    fn build_file_args(&self, path: &Path, sink_url: &str) -> Vec<String> {
        let mut args = vec![
            "-re".to_string(),
            "-i".to_string(),
            path.to_string_lossy().to_string(),
        ];
        self.push_output_args(&mut args, sink_url);
        args
    }

    fn push_output_args(&self, args: &mut Vec<String>, sink_url: &str) {
        args.extend([
            "-c".to_string(),
            "copy".to_string(),
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
        ]);
        args.extend(self.config.extra_ffmpeg_args.iter().cloned());
        args.extend([
            "-f".to_string(),
            self.config.output_format.clone(),
            sink_url.to_string(),
        ]);
    }

    /// Runs ffmpeg to completion, collecting error lines from stderr.
    async fn run(&self, args: &[String]) -> Result<(), TranscoderError> {
        debug!("Running {:?} {:?}", self.config.ffmpeg_path, args);

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TranscoderError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    TranscoderError::Io(e)
                }
            })?;

        let mut error_output = String::new();
        if let Some(stderr) = child.stderr.take() {
            let mut reader = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = reader.next_line().await {
                if line.contains("Error") || line.contains("error") {
                    error_output.push_str(&line);
                    error_output.push('\n');
                }
            }
        }

        let status = child.wait().await?;
        if !status.success() {
            return Err(TranscoderError::process_failed(
                format!("FFmpeg exited with code: {:?}", status.code()),
                if error_output.is_empty() {
                    None
                } else {
                    Some(error_output)
                },
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn transcode_from_remote(
        &self,
        playable_url: &str,
        sink_url: &str,
    ) -> Result<(), TranscoderError> {
        let args = self.build_remote_args(playable_url, sink_url);
        self.run(&args).await
    }

    async fn transcode_from_file(
        &self,
        path: &Path,
        sink_url: &str,
    ) -> Result<(), TranscoderError> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(TranscoderError::InputNotFound {
                path: path.to_path_buf(),
            });
        }
        let args = self.build_file_args(path, sink_url);
        self.run(&args).await
    }

    async fn validate(&self) -> Result<(), TranscoderError> {
        let result = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .output()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(TranscoderError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                })
            }
            Err(e) => Err(TranscoderError::Io(e)),
        }
    }
}
