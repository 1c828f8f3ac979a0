//! Auto playlist curation.
//!
//! An auto channel has no fixed links. Its playlist is synthesized from
//! keyword and channel-handle searches, filtered to videos and shuffled.
//! Once armed, a refresh task rebuilds it every `update_frequency` seconds.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::channel::{AutoSpec, ChannelId, MediaRef};
use crate::metrics;
use crate::search::{SearchItem, SearchProvider};
use crate::supervisor::Supervisor;

/// Keyword results are limited to this many days back.
pub const KEYWORD_WINDOW_DAYS: i64 = 2;

/// Channel results of news channels are limited to this many days back.
pub const NEWS_WINDOW_DAYS: i64 = 1;

/// Errors from playlist curation.
#[derive(Debug, Error)]
pub enum CuratorError {
    /// Every search came back empty or failed.
    #[error("no playlist could be built for channel {0}")]
    EmptyPlaylist(ChannelId),

    /// Refresh frequency must be positive.
    #[error("invalid update frequency {secs}s for channel {id}")]
    InvalidFrequency { id: ChannelId, secs: i64 },
}

/// Builds and refreshes auto playlists.
pub struct AutoCurator {
    search: Arc<dyn SearchProvider>,
    rng: Mutex<StdRng>,
}

impl AutoCurator {
    pub fn new(search: Arc<dyn SearchProvider>) -> Self {
        Self {
            search,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Curator with a deterministic shuffle.
    pub fn with_seed(search: Arc<dyn SearchProvider>, seed: u64) -> Self {
        Self {
            search,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Run every search of `spec` and combine the video hits, shuffled.
    ///
    /// A failing search is logged and contributes nothing.
    pub async fn build_playlist(&self, spec: &AutoSpec) -> Result<Vec<MediaRef>, CuratorError> {
        let now = Utc::now();
        let mut items: Vec<SearchItem> = Vec::new();

        for keyword in spec.keyword_list() {
            let since = now - chrono::Duration::days(KEYWORD_WINDOW_DAYS);
            match self.search.search_by_keyword(keyword, Some(since)).await {
                Ok(found) => items.extend(found),
                Err(e) => warn!(
                    "Search for keyword '{}' of channel {} failed: {}",
                    keyword, spec.id, e
                ),
            }
        }

        for handle in spec.channel_handles() {
            let since = spec
                .is_news
                .then(|| now - chrono::Duration::days(NEWS_WINDOW_DAYS));
            match self.search.search_by_channel_handle(handle, since).await {
                Ok(found) => items.extend(found),
                Err(e) => warn!(
                    "Search on channel '{}' for channel {} failed: {}",
                    handle, spec.id, e
                ),
            }
        }

        let mut playlist: Vec<MediaRef> = items
            .iter()
            .filter(|item| item.is_video())
            .map(|item| MediaRef::new(item.watch_url()))
            .collect();

        if playlist.is_empty() {
            return Err(CuratorError::EmptyPlaylist(spec.id));
        }

        self.shuffle(&mut playlist);
        debug!(
            "Built playlist of {} entries for channel {}",
            playlist.len(),
            spec.id
        );
        Ok(playlist)
    }

    /// Uniform in-place shuffle.
    pub fn shuffle(&self, playlist: &mut [MediaRef]) {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        playlist.shuffle(&mut *rng);
    }

    /// Arm a task that rebuilds the spec in `spec` every
    /// `update_frequency_secs` and hands each non-empty result, together
    /// with the spec it was built from, to `on_rebuilt`.
    ///
    /// Every tick reads the latest value of the cell, so later keyword or
    /// name changes are picked up. The period is fixed when armed. The task
    /// runs until shutdown. An empty rebuild keeps the current playlist.
    pub fn schedule_refresh<F, Fut>(
        self: &Arc<Self>,
        spec: watch::Receiver<AutoSpec>,
        supervisor: &Supervisor,
        on_rebuilt: F,
    ) -> Result<(), CuratorError>
    where
        F: Fn(AutoSpec, Vec<MediaRef>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (id, name, secs) = {
            let armed = spec.borrow();
            (armed.id, armed.name.clone(), armed.update_frequency_secs)
        };
        if secs <= 0 {
            return Err(CuratorError::InvalidFrequency { id, secs });
        }

        let period = Duration::from_secs(secs as u64);
        let curator = Arc::clone(self);
        let mut shutdown = supervisor.shutdown_signal();

        info!("Refreshing channel {} ({}) every {:?}", id, name, period);

        supervisor.spawn(format!("refresh-{}", id), async move {
            let mut ticks = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    _ = ticks.tick() => {
                        let current = spec.borrow().clone();
                        info!("Refreshing auto channel {} ({})", current.id, current.name);
                        match curator.build_playlist(&current).await {
                            Ok(playlist) => {
                                metrics::PLAYLIST_REFRESHES_TOTAL
                                    .with_label_values(&["success"])
                                    .inc();
                                on_rebuilt(current, playlist).await;
                            }
                            Err(e) => {
                                metrics::PLAYLIST_REFRESHES_TOTAL
                                    .with_label_values(&["empty"])
                                    .inc();
                                warn!("Keeping current playlist of channel {}: {}", id, e);
                            }
                        }
                    }
                }
            }
            info!("Refresh of channel {} stopped", id);
        });

        Ok(())
    }
}
