//! Error types for the transcoder module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while pushing media to a sink.
#[derive(Debug, Error)]
pub enum TranscoderError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// Local input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// The transcode process exited unsuccessfully.
    #[error("Transcode failed: {reason}")]
    ProcessFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// I/O error while running the process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranscoderError {
    /// Creates a new process failed error with stderr output.
    pub fn process_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ProcessFailed {
            reason: reason.into(),
            stderr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TranscoderError::process_failed("FFmpeg exited with code: Some(1)", None);
        assert_eq!(
            err.to_string(),
            "Transcode failed: FFmpeg exited with code: Some(1)"
        );

        let err = TranscoderError::FfmpegNotFound {
            path: PathBuf::from("/opt/ffmpeg"),
        };
        assert_eq!(err.to_string(), "FFmpeg not found at path: /opt/ffmpeg");
    }
}
