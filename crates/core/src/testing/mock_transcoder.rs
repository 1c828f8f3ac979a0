//! Mock transcoder for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, RwLock};

use crate::transcoder::{Transcoder, TranscoderError};

/// What a transcode was fed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscodeInput {
    Remote(String),
    File(PathBuf),
}

impl TranscodeInput {
    fn key(&self) -> String {
        match self {
            TranscodeInput::Remote(url) => url.clone(),
            TranscodeInput::File(path) => path.to_string_lossy().into_owned(),
        }
    }
}

/// A recorded transcode for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedTranscode {
    pub input: TranscodeInput,
    pub sink_url: String,
    pub success: bool,
}

/// Mock implementation of the Transcoder trait.
///
/// Records every call, optionally fails for chosen inputs and can simulate
/// the real-time duration of a push.
#[derive(Debug, Clone)]
pub struct MockTranscoder {
    transcodes: Arc<RwLock<Vec<RecordedTranscode>>>,
    failing_inputs: Arc<RwLock<HashSet<String>>>,
    transcode_duration: Arc<RwLock<Duration>>,
    validation_error: Arc<RwLock<Option<String>>>,
    recorded: Arc<Notify>,
}

impl Default for MockTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTranscoder {
    pub fn new() -> Self {
        Self {
            transcodes: Arc::new(RwLock::new(Vec::new())),
            failing_inputs: Arc::new(RwLock::new(HashSet::new())),
            transcode_duration: Arc::new(RwLock::new(Duration::ZERO)),
            validation_error: Arc::new(RwLock::new(None)),
            recorded: Arc::new(Notify::new()),
        }
    }

    /// Get all recorded transcodes.
    pub async fn recorded_transcodes(&self) -> Vec<RecordedTranscode> {
        self.transcodes.read().await.clone()
    }

    pub async fn transcode_count(&self) -> usize {
        self.transcodes.read().await.len()
    }

    /// Fail every transcode whose input URL or path equals `input`.
    pub async fn fail_for(&self, input: &str) {
        self.failing_inputs.write().await.insert(input.to_string());
    }

    /// Make each transcode take `duration`.
    pub async fn set_transcode_duration(&self, duration: Duration) {
        *self.transcode_duration.write().await = duration;
    }

    /// Make `validate()` fail with `reason`.
    pub async fn set_validation_error(&self, reason: &str) {
        *self.validation_error.write().await = Some(reason.to_string());
    }

    /// Wait until at least `count` transcodes were recorded.
    pub async fn wait_for_transcodes(
        &self,
        count: usize,
        timeout: Duration,
    ) -> Result<(), tokio::time::error::Elapsed> {
        tokio::time::timeout(timeout, async {
            loop {
                let notified = self.recorded.notified();
                if self.transcode_count().await >= count {
                    return;
                }
                notified.await;
            }
        })
        .await
    }

    async fn record(&self, input: TranscodeInput, sink_url: &str) -> Result<(), TranscoderError> {
        let duration = *self.transcode_duration.read().await;
        if duration.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(duration).await;
        }

        let fails = self.failing_inputs.read().await.contains(&input.key());
        self.transcodes.write().await.push(RecordedTranscode {
            input: input.clone(),
            sink_url: sink_url.to_string(),
            success: !fails,
        });
        self.recorded.notify_waiters();

        if fails {
            return Err(TranscoderError::process_failed(
                format!("mock failure for {}", input.key()),
                Some("error: simulated".to_string()),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn transcode_from_remote(
        &self,
        playable_url: &str,
        sink_url: &str,
    ) -> Result<(), TranscoderError> {
        self.record(TranscodeInput::Remote(playable_url.to_string()), sink_url)
            .await
    }

    async fn transcode_from_file(&self, path: &Path, sink_url: &str) -> Result<(), TranscoderError> {
        self.record(TranscodeInput::File(path.to_path_buf()), sink_url)
            .await
    }

    async fn validate(&self) -> Result<(), TranscoderError> {
        match self.validation_error.read().await.clone() {
            Some(reason) => Err(TranscoderError::process_failed(reason, None)),
            None => Ok(()),
        }
    }
}
