//! Streaming HTTP transfer.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::rate_limiter::ByteRateLimiter;
use super::types::{Transfer, TransferError};

/// Downloads with `reqwest`, throttled per transfer.
pub struct HttpTransfer {
    client: Client,
}

impl HttpTransfer {
    pub fn new() -> Result<Self, TransferError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transfer for HttpTransfer {
    async fn rate_limited_fetch(
        &self,
        url: &str,
        dest: &Path,
        max_bytes_per_second: u64,
    ) -> Result<u64, TransferError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::Status(status.as_u16()));
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut limiter = ByteRateLimiter::new(max_bytes_per_second);
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            limiter.acquire(chunk.len() as u64).await;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        file.sync_all().await?;

        debug!("Fetched {} bytes from {} into {:?}", written, url, dest);
        Ok(written)
    }
}
