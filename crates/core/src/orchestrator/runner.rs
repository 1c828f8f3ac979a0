//! Stream orchestrator implementation.
//!
//! Owns the channel registry and every task of the engine:
//! - Playback: one long-lived loop per channel id
//! - Download: one short-lived run per request
//! - Refresh: one long-lived scheduler per updated auto channel

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::cache::MediaCache;
use crate::channel::{AutoSpec, Channel, ChannelId, ChannelSpec, ChannelSummary, MediaRef, Registry};
use crate::config::{Config, StreamingConfig};
use crate::curator::AutoCurator;
use crate::downloader::Downloader;
use crate::error::ExternalProcessError;
use crate::extractor::Extractor;
use crate::metrics;
use crate::playback::PlaybackLoop;
use crate::provider::SpecProvider;
use crate::search::SearchProvider;
use crate::supervisor::Supervisor;
use crate::transcoder::Transcoder;
use crate::transfer::Transfer;

use super::config::OrchestratorConfig;
use super::types::{OrchestratorError, OrchestratorStatus};

/// External capabilities the orchestrator drives.
#[derive(Clone)]
pub struct Collaborators {
    pub provider: Arc<dyn SpecProvider>,
    pub transcoder: Arc<dyn Transcoder>,
    pub extractor: Arc<dyn Extractor>,
    pub transfer: Arc<dyn Transfer>,
    pub search: Arc<dyn SearchProvider>,
}

/// The stream orchestrator. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    config: OrchestratorConfig,
    streaming: StreamingConfig,
    cache: MediaCache,
    registry: Registry,
    provider: Arc<dyn SpecProvider>,
    transcoder: Arc<dyn Transcoder>,
    extractor: Arc<dyn Extractor>,
    downloader: Arc<Downloader>,
    curator: Arc<AutoCurator>,
    supervisor: Supervisor,
    // Ids with a running playback loop.
    playing: Mutex<HashSet<ChannelId>>,
    // Armed refresh schedulers, each reading the latest spec of its id.
    refreshing: Mutex<HashMap<ChannelId, watch::Sender<AutoSpec>>>,
}

impl Orchestrator {
    pub fn new(config: &Config, collaborators: Collaborators) -> Self {
        let curator = AutoCurator::new(Arc::clone(&collaborators.search));
        Self::with_curator(config, collaborators, curator)
    }

    /// Orchestrator with a caller-provided curator (e.g. a seeded one).
    pub fn with_curator(config: &Config, collaborators: Collaborators, curator: AutoCurator) -> Self {
        let cache = MediaCache::from_config(&config.storage);
        let downloader = Downloader::new(
            cache.clone(),
            Arc::clone(&collaborators.extractor),
            collaborators.transfer,
            config.storage.max_bytes_per_second(),
        );

        Self {
            inner: Arc::new(Inner {
                config: config.orchestrator.clone(),
                streaming: config.streaming.clone(),
                cache,
                registry: Registry::new(),
                provider: collaborators.provider,
                transcoder: collaborators.transcoder,
                extractor: collaborators.extractor,
                downloader: Arc::new(downloader),
                curator: Arc::new(curator),
                supervisor: Supervisor::new(),
                playing: Mutex::new(HashSet::new()),
                refreshing: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn is_running(&self) -> bool {
        self.inner.supervisor.is_running()
    }

    /// Check that the transcoder can run. Skipped when streaming is disabled.
    pub async fn validate(&self) -> Result<(), OrchestratorError> {
        if self.inner.streaming.disabled {
            return Ok(());
        }
        self.inner
            .transcoder
            .validate()
            .await
            .map_err(ExternalProcessError::from)?;
        Ok(())
    }

    /// Fetch every channel spec once, register them all, then launch tasks.
    ///
    /// Returns the number of registered channels. A provider failure is
    /// returned to the caller; auto specs that yield no playlist are skipped.
    pub async fn bootstrap(&self) -> Result<usize, OrchestratorError> {
        info!("Fetching channel specs");
        let specs = self.inner.provider.fetch_specs().await?;
        info!("Received {} channel specs, populating registry", specs.len());

        for spec in specs {
            if spec.is_auto() {
                match self.inner.curator.build_playlist(&spec.auto_spec()).await {
                    Ok(playlist) => {
                        self.register(Channel::new(spec.id, spec.name, spec.slug, true, playlist))
                            .await;
                    }
                    Err(e) => warn!("Skipping auto channel {} ({}): {}", spec.id, spec.name, e),
                }
            } else {
                self.register(spec.to_channel()).await;
            }
        }

        let channels = self.inner.registry.snapshot().await;
        for channel in &channels {
            let start_download = !channel.is_auto().await;
            self.launch(channel, start_download).await;
        }

        info!("Bootstrapped {} channels", channels.len());
        Ok(channels.len())
    }

    /// Register `channel` and start its tasks.
    ///
    /// An already registered id has its content replaced in place; its
    /// running playback loop picks the new playlist up.
    pub async fn add_channel(&self, channel: Channel, start_download: bool) -> Arc<Channel> {
        let channel = self.register(channel).await;
        info!("Added channel {} ({})", channel.id(), channel.slug().await);
        self.launch(&channel, start_download).await;
        channel
    }

    /// Build an auto channel's playlist once and register it.
    ///
    /// No refresh scheduler is armed and nothing is downloaded.
    pub async fn add_auto_channel(&self, spec: &AutoSpec) -> Result<Arc<Channel>, OrchestratorError> {
        info!("Adding auto channel {} ({})", spec.id, spec.name);
        let playlist = self.inner.curator.build_playlist(spec).await?;
        let channel = Channel::new(spec.id, spec.name.clone(), spec.slug.clone(), true, playlist);
        Ok(self.add_channel(channel, false).await)
    }

    /// Replace the name and playlist of a registered channel.
    pub async fn update_channel(
        &self,
        spec: &ChannelSpec,
        start_download: bool,
    ) -> Result<(), OrchestratorError> {
        info!("Updating channel {} ({})", spec.id, spec.name);
        self.replace_content(spec.id, &spec.name, spec.playlist(), start_download)
            .await
    }

    /// Rebuild an auto channel's playlist and replace it.
    ///
    /// The first successful update of an id also arms its refresh scheduler;
    /// later updates hand it the new spec for its next tick. A non-positive
    /// frequency is reported as a validation error after the playlist was
    /// replaced; no scheduler is created then.
    pub async fn update_auto_channel(&self, spec: &AutoSpec) -> Result<(), OrchestratorError> {
        info!("Updating auto channel {} ({})", spec.id, spec.name);
        let playlist = self.inner.curator.build_playlist(spec).await?;
        self.replace_content(spec.id, &spec.name, playlist, false)
            .await?;

        let cell = {
            let mut refreshing = lock(&self.inner.refreshing);
            if let Some(cell) = refreshing.get(&spec.id) {
                cell.send_replace(spec.clone());
                return Ok(());
            }
            let (cell, latest) = watch::channel(spec.clone());
            refreshing.insert(spec.id, cell);
            latest
        };

        let weak = Arc::downgrade(&self.inner);
        let armed = self.inner.curator.schedule_refresh(
            cell,
            &self.inner.supervisor,
            move |spec, playlist| {
                let weak = weak.clone();
                async move {
                    if let Some(orchestrator) = Orchestrator::upgrade(&weak) {
                        if let Err(e) = orchestrator
                            .replace_content(spec.id, &spec.name, playlist, false)
                            .await
                        {
                            error!("Refresh of channel {} failed: {}", spec.id, e);
                        }
                    }
                }
            },
        );

        if let Err(e) = armed {
            lock(&self.inner.refreshing).remove(&spec.id);
            warn!("Not refreshing channel {}: {}", spec.id, e);
            return Err(e.into());
        }
        Ok(())
    }

    /// Signal shutdown to every task.
    pub fn stop(&self) {
        info!("Stopping orchestrator");
        self.inner.supervisor.stop();
    }

    /// Block until every task exited.
    pub async fn wait_stopped(&self) {
        self.inner.supervisor.wait_stopped().await;
        info!("Orchestrator stopped");
    }

    /// `wait_stopped` bounded by the configured grace period, aborting
    /// whatever is still running afterwards.
    pub async fn wait_stopped_with_grace(&self) -> bool {
        let grace = Duration::from_secs(self.inner.config.shutdown_grace_secs);
        let clean = self.inner.supervisor.wait_stopped_with_grace(grace).await;
        info!("Orchestrator stopped (clean: {})", clean);
        clean
    }

    pub async fn channel_summaries(&self) -> Vec<ChannelSummary> {
        let mut summaries = Vec::new();
        for channel in self.inner.registry.snapshot().await {
            summaries.push(channel.summary().await);
        }
        summaries
    }

    pub async fn status(&self) -> OrchestratorStatus {
        OrchestratorStatus {
            running: self.is_running(),
            channels: self.inner.registry.len().await,
            playing: lock(&self.inner.playing).len(),
            refreshing: lock(&self.inner.refreshing).len(),
            tasks: self.inner.supervisor.task_count(),
        }
    }

    fn upgrade(weak: &Weak<Inner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    /// Insert a channel, or move its content into the already registered one.
    async fn register(&self, channel: Channel) -> Arc<Channel> {
        let candidate = Arc::new(channel);
        let (registered, inserted) = self
            .inner
            .registry
            .get_or_insert(Arc::clone(&candidate))
            .await;

        if inserted {
            metrics::CHANNELS_REGISTERED.set(self.inner.registry.len().await as i64);
        } else {
            registered.overwrite_from(&candidate).await;
        }
        registered
    }

    async fn replace_content(
        &self,
        id: ChannelId,
        name: &str,
        playlist: Vec<MediaRef>,
        start_download: bool,
    ) -> Result<(), OrchestratorError> {
        let Some(channel) = self.inner.registry.get(id).await else {
            warn!("Channel {} ({}) does not exist, update dropped", id, name);
            return Err(OrchestratorError::ChannelNotFound(id));
        };

        channel.replace(name, playlist).await;
        info!("Channel {} now has {} entries", id, channel.summary().await.entries);

        if start_download {
            self.start_download(&channel).await;
        }
        Ok(())
    }

    async fn launch(&self, channel: &Arc<Channel>, start_download: bool) {
        if !self.inner.streaming.disabled {
            self.start_playback(channel);
        }
        if start_download {
            self.start_download(channel).await;
        }
    }

    /// Spawn the playback loop of `channel` unless its id already has one.
    fn start_playback(&self, channel: &Arc<Channel>) {
        let id = channel.id();
        if !lock(&self.inner.playing).insert(id) {
            return;
        }

        let playback = PlaybackLoop::new(
            Arc::clone(channel),
            self.inner.streaming.clone(),
            self.inner.cache.clone(),
            Arc::clone(&self.inner.transcoder),
            Arc::clone(&self.inner.extractor),
        )
        .with_empty_backoff(
            Duration::from_millis(self.inner.config.empty_playlist_backoff_ms),
            Duration::from_millis(self.inner.config.max_empty_playlist_backoff_ms),
        );

        let shutdown = self.inner.supervisor.shutdown_signal();
        let weak = Arc::downgrade(&self.inner);
        self.inner.supervisor.spawn(format!("playback-{}", id), async move {
            playback.run(shutdown).await;
            if let Some(inner) = weak.upgrade() {
                lock(&inner.playing).remove(&id);
            }
        });
    }

    /// Spawn a downloader over the current playlist snapshot.
    async fn start_download(&self, channel: &Arc<Channel>) {
        let id = channel.id();
        let playlist = channel.playlist().await;
        let downloader = Arc::clone(&self.inner.downloader);
        self.inner.supervisor.spawn(format!("download-{}", id), async move {
            downloader.run(id, &playlist).await;
        });
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
