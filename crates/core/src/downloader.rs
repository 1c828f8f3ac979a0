//! One-shot caching pipeline for a channel's entries.
//!
//! Each run walks a playlist snapshot in order. Entries already cached are
//! skipped; the rest are resolved, fetched under the transfer-rate ceiling
//! into a staging path and renamed into place once complete. A failed entry
//! leaves no file at its final path and does not stop the run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::cache::MediaCache;
use crate::channel::{ChannelId, MediaRef};
use crate::error::ExternalProcessError;
use crate::extractor::Extractor;
use crate::metrics;
use crate::transfer::Transfer;

/// What happened to one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// A complete copy already existed.
    AlreadyCached,
    /// Another run is fetching the same entry right now.
    InProgress,
    /// Downloaded and promoted to the final path.
    Downloaded { bytes: u64 },
}

/// Totals of a downloader run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Fills the media cache for playlist snapshots.
pub struct Downloader {
    cache: MediaCache,
    extractor: Arc<dyn Extractor>,
    transfer: Arc<dyn Transfer>,
    max_bytes_per_second: u64,
    // Final paths currently being fetched; one staging file per path.
    in_flight: Arc<Mutex<HashSet<PathBuf>>>,
}

/// Releases an in-flight claim, also when the download task is aborted.
struct InFlight {
    set: Arc<Mutex<HashSet<PathBuf>>>,
    path: PathBuf,
}

impl InFlight {
    fn claim(set: &Arc<Mutex<HashSet<PathBuf>>>, path: &Path) -> Option<Self> {
        let inserted = set
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.to_path_buf());
        inserted.then(|| Self {
            set: Arc::clone(set),
            path: path.to_path_buf(),
        })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.path);
    }
}

impl Downloader {
    pub fn new(
        cache: MediaCache,
        extractor: Arc<dyn Extractor>,
        transfer: Arc<dyn Transfer>,
        max_bytes_per_second: u64,
    ) -> Self {
        Self {
            cache,
            extractor,
            transfer,
            max_bytes_per_second,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Cache every entry of `playlist`, sequentially.
    ///
    /// Duplicate concurrent runs over overlapping playlists are tolerated:
    /// an entry being fetched by one run is skipped by the others.
    pub async fn run(&self, channel_id: ChannelId, playlist: &[MediaRef]) -> DownloadReport {
        info!(
            "Downloader started for channel {} ({} entries)",
            channel_id,
            playlist.len()
        );

        if let Err(e) = self.cache.ensure_root().await {
            warn!(
                "Cannot create cache root {:?} for channel {}: {}",
                self.cache.root(),
                channel_id,
                e
            );
            return DownloadReport {
                failed: playlist.len(),
                ..Default::default()
            };
        }

        let mut report = DownloadReport::default();
        for media in playlist {
            match self.download_one(media).await {
                Ok(DownloadOutcome::AlreadyCached | DownloadOutcome::InProgress) => {
                    metrics::DOWNLOADS_TOTAL.with_label_values(&["skipped"]).inc();
                    report.skipped += 1;
                }
                Ok(DownloadOutcome::Downloaded { bytes }) => {
                    metrics::DOWNLOADS_TOTAL.with_label_values(&["success"]).inc();
                    metrics::DOWNLOAD_BYTES
                        .with_label_values(&[])
                        .observe(bytes as f64);
                    report.downloaded += 1;
                }
                Err(e) => {
                    metrics::DOWNLOADS_TOTAL.with_label_values(&["failed"]).inc();
                    warn!("Failed to cache {} for channel {}: {}", media, channel_id, e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Downloader finished for channel {}: {} downloaded, {} cached, {} failed",
            channel_id, report.downloaded, report.skipped, report.failed
        );
        report
    }

    /// Cache a single entry.
    pub async fn download_one(
        &self,
        media: &MediaRef,
    ) -> Result<DownloadOutcome, ExternalProcessError> {
        let final_path = self.cache.path_for(media);
        if self.cache.contains(media).await {
            debug!("{} already cached at {:?}", media, final_path);
            return Ok(DownloadOutcome::AlreadyCached);
        }

        let Some(_claim) = InFlight::claim(&self.in_flight, &final_path) else {
            debug!("{} is already being downloaded", media);
            return Ok(DownloadOutcome::InProgress);
        };
        // Another run may have finished between the check and the claim.
        if self.cache.contains(media).await {
            return Ok(DownloadOutcome::AlreadyCached);
        }

        let staging = MediaCache::staging_path(&final_path);
        let resolved = match self.extractor.resolve_stream_url(media).await {
            Ok(resolved) => resolved,
            Err(e) => {
                discard_staging(&staging).await;
                return Err(e.into());
            }
        };

        info!("Downloading {} ({}) to {:?}", media, resolved.title, final_path);

        let bytes = match self
            .transfer
            .rate_limited_fetch(&resolved.playable_url, &staging, self.max_bytes_per_second)
            .await
        {
            Ok(bytes) => bytes,
            Err(e) => {
                discard_staging(&staging).await;
                return Err(e.into());
            }
        };

        if let Err(e) = tokio::fs::rename(&staging, &final_path).await {
            discard_staging(&staging).await;
            return Err(e.into());
        }

        info!("Cached {} ({} bytes) at {:?}", media, bytes, final_path);
        Ok(DownloadOutcome::Downloaded { bytes })
    }
}

async fn discard_staging(staging: &Path) {
    if let Err(e) = tokio::fs::remove_file(staging).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove staging file {:?}: {}", staging, e);
        }
    }
}
