//! Types for the transfer module.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while fetching media.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status code: {0}")]
    Status(u16),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fetches a remote resource to a local file under a throughput ceiling.
#[async_trait]
pub trait Transfer: Send + Sync {
    /// Fetch `url` into `dest`, never exceeding `max_bytes_per_second`.
    ///
    /// On success the whole body has been written and flushed to `dest`.
    /// Returns the number of bytes written.
    async fn rate_limited_fetch(
        &self,
        url: &str,
        dest: &Path,
        max_bytes_per_second: u64,
    ) -> Result<u64, TransferError>;
}
