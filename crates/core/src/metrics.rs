//! Prometheus metrics for core components.
//!
//! - Playback (transcodes by source and result)
//! - Cache downloads
//! - Auto playlist refreshes

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Playback
// =============================================================================

/// Transcode runs by input source ("cache", "remote") and result.
pub static TRANSCODES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("restreamer_transcodes_total", "Total transcode runs"),
        &["source", "result"], // result: "success", "failed"
    )
    .unwrap()
});

/// Stream URL resolutions by result.
pub static RESOLUTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "restreamer_resolutions_total",
            "Total stream URL resolutions",
        ),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Cache
// =============================================================================

/// Cache downloads by result ("success", "failed", "skipped").
pub static DOWNLOADS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("restreamer_downloads_total", "Total cache downloads"),
        &["result"],
    )
    .unwrap()
});

/// Bytes written to the cache per completed download.
pub static DOWNLOAD_BYTES: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "restreamer_download_bytes",
            "Size of completed cache downloads",
        )
        .buckets(vec![1e6, 1e7, 5e7, 1e8, 2.5e8, 5e8, 1e9]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Channels
// =============================================================================

/// Auto playlist rebuilds by result ("success", "empty", "failed").
pub static PLAYLIST_REFRESHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "restreamer_playlist_refreshes_total",
            "Total auto playlist rebuilds",
        ),
        &["result"],
    )
    .unwrap()
});

/// Channels currently registered.
pub static CHANNELS_REGISTERED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "restreamer_channels_registered",
        "Number of registered channels",
    )
    .unwrap()
});

/// Playback loops currently running.
pub static PLAYBACK_LOOPS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "restreamer_playback_loops_active",
        "Number of running playback loops",
    )
    .unwrap()
});

/// All core metrics, for registration in the server's registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(TRANSCODES_TOTAL.clone()),
        Box::new(RESOLUTIONS_TOTAL.clone()),
        Box::new(DOWNLOADS_TOTAL.clone()),
        Box::new(DOWNLOAD_BYTES.clone()),
        Box::new(PLAYLIST_REFRESHES_TOTAL.clone()),
        Box::new(CHANNELS_REGISTERED.clone()),
        Box::new(PLAYBACK_LOOPS_ACTIVE.clone()),
    ]
}

/// Label value for an operation outcome.
pub(crate) fn result_label<T, E>(result: &Result<T, E>) -> &'static str {
    if result.is_ok() {
        "success"
    } else {
        "failed"
    }
}
