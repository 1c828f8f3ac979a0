//! Cache integrity tests for the downloader.
//!
//! The final cache path must never hold a partial file, whether a transfer
//! fails or the process dies halfway through.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio::sync::Notify;

use restreamer_core::{
    testing::{MockExtractor, MockTransfer},
    Downloader, MediaCache, MediaRef, Transfer, TransferError,
};

/// Writes half a body, signals, then never finishes.
struct StallingTransfer {
    half_written: Arc<Notify>,
}

#[async_trait]
impl Transfer for StallingTransfer {
    async fn rate_limited_fetch(
        &self,
        _url: &str,
        dest: &Path,
        _max_bytes_per_second: u64,
    ) -> Result<u64, TransferError> {
        let mut file = tokio::fs::File::create(dest).await?;
        file.write_all(b"half of the").await?;
        file.flush().await?;
        self.half_written.notify_one();
        std::future::pending::<()>().await;
        Ok(0)
    }
}

#[tokio::test]
async fn test_crash_mid_download_never_exposes_partial_file() {
    let dir = TempDir::new().unwrap();
    let half_written = Arc::new(Notify::new());
    let downloader = Arc::new(Downloader::new(
        MediaCache::new(dir.path(), "mp4"),
        Arc::new(MockExtractor::new()),
        Arc::new(StallingTransfer {
            half_written: Arc::clone(&half_written),
        }),
        1024,
    ));
    let media = MediaRef::from("https://youtube.com/watch?v=crash");

    let task = {
        let downloader = Arc::clone(&downloader);
        let media = media.clone();
        tokio::spawn(async move { downloader.run(1, &[media]).await })
    };

    tokio::time::timeout(Duration::from_secs(5), half_written.notified())
        .await
        .expect("transfer started");
    task.abort();
    let _ = task.await;

    let cache = MediaCache::new(dir.path(), "mp4");
    let final_path = cache.path_for(&media);
    assert!(!final_path.exists());
    assert!(MediaCache::staging_path(&final_path).exists());
    assert!(!cache.contains(&media).await);
}

#[tokio::test]
async fn test_restart_after_crash_replaces_staging() {
    let dir = TempDir::new().unwrap();
    let cache = MediaCache::new(dir.path(), "mp4");
    let media = MediaRef::from("https://youtube.com/watch?v=again");
    let final_path = cache.path_for(&media);
    let staging = MediaCache::staging_path(&final_path);
    std::fs::write(&staging, b"leftover").unwrap();

    let transfer = Arc::new(MockTransfer::new());
    transfer.set_body(b"complete body").await;
    let downloader = Downloader::new(
        cache.clone(),
        Arc::new(MockExtractor::new()),
        transfer,
        1024,
    );

    let report = downloader.run(1, &[media]).await;
    assert_eq!(report.downloaded, 1);
    assert_eq!(std::fs::read(&final_path).unwrap(), b"complete body");
    assert!(!staging.exists());
}

#[tokio::test]
async fn test_concurrent_duplicate_runs_are_tolerated() {
    let dir = TempDir::new().unwrap();
    let transfer = Arc::new(MockTransfer::new());
    let downloader = Arc::new(Downloader::new(
        MediaCache::new(dir.path(), "mp4"),
        Arc::new(MockExtractor::new()),
        transfer.clone(),
        1024,
    ));
    let playlist: Vec<MediaRef> = (0..5)
        .map(|i| MediaRef::new(format!("https://youtube.com/watch?v={}", i)))
        .collect();

    let a = {
        let downloader = Arc::clone(&downloader);
        let playlist = playlist.clone();
        tokio::spawn(async move { downloader.run(1, &playlist).await })
    };
    let b = {
        let downloader = Arc::clone(&downloader);
        let playlist = playlist.clone();
        tokio::spawn(async move { downloader.run(1, &playlist).await })
    };
    let (a, b) = (a.await.unwrap(), b.await.unwrap());

    assert_eq!(a.downloaded + a.skipped, 5);
    assert_eq!(b.downloaded + b.skipped, 5);

    let cache = MediaCache::new(dir.path(), "mp4");
    for media in &playlist {
        let body = std::fs::read(cache.path_for(media)).unwrap();
        assert_eq!(body, b"mock media body");
    }
}
