//! Mock extractor for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::channel::MediaRef;
use crate::extractor::{Extractor, ExtractorError, ResolvedStream};

/// Mock implementation of the Extractor trait.
///
/// Every source resolves to a deterministic playable URL (see
/// [`MockExtractor::playable_url_for`]) unless configured to fail.
#[derive(Debug, Clone, Default)]
pub struct MockExtractor {
    calls: Arc<RwLock<Vec<MediaRef>>>,
    failing: Arc<RwLock<HashSet<MediaRef>>>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// The playable URL `source` resolves to.
    pub fn playable_url_for(&self, source: &MediaRef) -> String {
        format!("https://media.invalid/{:x}.mp4", md5::compute(source.as_str()))
    }

    /// Fail every resolution of `source`.
    pub async fn fail_for(&self, source: &MediaRef) {
        self.failing.write().await.insert(source.clone());
    }

    pub async fn recorded_calls(&self) -> Vec<MediaRef> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }
}

#[async_trait]
impl Extractor for MockExtractor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn resolve_stream_url(&self, source: &MediaRef) -> Result<ResolvedStream, ExtractorError> {
        self.calls.write().await.push(source.clone());

        if self.failing.read().await.contains(source) {
            return Err(ExtractorError::ExtractionFailed {
                source_url: source.to_string(),
                reason: "mock failure".to_string(),
            });
        }

        Ok(ResolvedStream {
            title: format!("Title of {}", source),
            playable_url: self.playable_url_for(source),
        })
    }
}
