//! Mock transfer for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::transfer::{Transfer, TransferError};

/// A recorded fetch for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedFetch {
    pub url: String,
    pub dest: PathBuf,
    pub max_bytes_per_second: u64,
}

/// Mock implementation of the Transfer trait.
///
/// Writes a fixed body to the destination. URLs can be set to fail before
/// writing anything, or after writing part of the body, which is what a
/// crash mid-download leaves behind.
#[derive(Debug, Clone)]
pub struct MockTransfer {
    fetches: Arc<RwLock<Vec<RecordedFetch>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    failing_partial: Arc<RwLock<HashSet<String>>>,
    body: Arc<RwLock<Vec<u8>>>,
}

impl Default for MockTransfer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransfer {
    pub fn new() -> Self {
        Self {
            fetches: Arc::new(RwLock::new(Vec::new())),
            failing: Arc::new(RwLock::new(HashSet::new())),
            failing_partial: Arc::new(RwLock::new(HashSet::new())),
            body: Arc::new(RwLock::new(b"mock media body".to_vec())),
        }
    }

    pub async fn set_body(&self, body: &[u8]) {
        *self.body.write().await = body.to_vec();
    }

    /// Fail fetches of `url` before writing.
    pub async fn fail_for(&self, url: &str) {
        self.failing.write().await.insert(url.to_string());
    }

    /// Fail fetches of `url` after writing half of the body.
    pub async fn fail_after_partial_write(&self, url: &str) {
        self.failing_partial.write().await.insert(url.to_string());
    }

    pub async fn recorded_fetches(&self) -> Vec<RecordedFetch> {
        self.fetches.read().await.clone()
    }

    pub async fn fetch_count(&self) -> usize {
        self.fetches.read().await.len()
    }
}

#[async_trait]
impl Transfer for MockTransfer {
    async fn rate_limited_fetch(
        &self,
        url: &str,
        dest: &Path,
        max_bytes_per_second: u64,
    ) -> Result<u64, TransferError> {
        self.fetches.write().await.push(RecordedFetch {
            url: url.to_string(),
            dest: dest.to_path_buf(),
            max_bytes_per_second,
        });

        if self.failing.read().await.contains(url) {
            return Err(TransferError::Status(503));
        }

        let body = self.body.read().await.clone();
        let mut file = tokio::fs::File::create(dest).await?;

        if self.failing_partial.read().await.contains(url) {
            file.write_all(&body[..body.len() / 2]).await?;
            file.flush().await?;
            return Err(TransferError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset mid-transfer",
            )));
        }

        file.write_all(&body).await?;
        file.flush().await?;
        Ok(body.len() as u64)
    }
}
