//! Trait definitions for the transcoder module.

use async_trait::async_trait;
use std::path::Path;

use super::error::TranscoderError;

/// Pushes media to a sink in real time.
///
/// Both calls block for the whole duration of the pushed media.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Returns the name of this transcoder implementation.
    fn name(&self) -> &str;

    /// Re-stream a directly playable remote URL to `sink_url`.
    async fn transcode_from_remote(
        &self,
        playable_url: &str,
        sink_url: &str,
    ) -> Result<(), TranscoderError>;

    /// Re-stream a cached local file to `sink_url`.
    async fn transcode_from_file(&self, path: &Path, sink_url: &str)
        -> Result<(), TranscoderError>;

    /// Validates that the transcoder is properly configured and ready.
    async fn validate(&self) -> Result<(), TranscoderError>;
}
