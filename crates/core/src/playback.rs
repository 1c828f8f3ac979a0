//! Per-channel playback loop.
//!
//! A loop cycles forever over its channel's live playlist, pushing each
//! entry to the sink named by the channel's current slug. Cached entries are streamed from disk,
//! others are resolved and streamed from the remote source. Failures are
//! logged and the loop moves on to the next entry.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cache::MediaCache;
use crate::channel::{Channel, Cue, MediaRef};
use crate::config::StreamingConfig;
use crate::error::ExternalProcessError;
use crate::extractor::Extractor;
use crate::metrics;
use crate::supervisor::ShutdownSignal;
use crate::transcoder::Transcoder;

/// Where an entry was streamed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaySource {
    Cache,
    Remote,
}

impl PlaySource {
    fn as_str(&self) -> &'static str {
        match self {
            PlaySource::Cache => "cache",
            PlaySource::Remote => "remote",
        }
    }
}

/// Doubling wait used while the playlist is empty.
#[derive(Debug, Clone)]
struct EmptyBackoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl EmptyBackoff {
    fn new(initial: Duration, max: Duration) -> Self {
        let initial = initial.max(Duration::from_millis(1));
        Self {
            initial,
            max: max.max(initial),
            current: initial,
        }
    }

    fn next(&mut self) -> Duration {
        let wait = self.current;
        self.current = (self.current * 2).min(self.max);
        wait
    }

    fn reset(&mut self) {
        self.current = self.initial;
    }
}

/// Cycles a channel's playlist into its sink.
pub struct PlaybackLoop {
    channel: Arc<Channel>,
    streaming: StreamingConfig,
    cache: MediaCache,
    transcoder: Arc<dyn Transcoder>,
    extractor: Arc<dyn Extractor>,
    cursor: usize,
    backoff: EmptyBackoff,
}

impl PlaybackLoop {
    pub fn new(
        channel: Arc<Channel>,
        streaming: StreamingConfig,
        cache: MediaCache,
        transcoder: Arc<dyn Transcoder>,
        extractor: Arc<dyn Extractor>,
    ) -> Self {
        Self {
            channel,
            streaming,
            cache,
            transcoder,
            extractor,
            cursor: 0,
            backoff: EmptyBackoff::new(Duration::from_secs(1), Duration::from_secs(30)),
        }
    }

    /// Bounds of the wait between checks of an empty playlist.
    pub fn with_empty_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.backoff = EmptyBackoff::new(initial, max);
        self
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Play the entry under the cursor and advance.
    ///
    /// Returns the entry that was attempted, or `None` when the playlist is
    /// empty. The channel lock is only held to read the entry and to compute
    /// the next cursor, never while the transcoder runs.
    pub async fn step(&mut self) -> Option<MediaRef> {
        let Cue { index, media, slug } = self.channel.cue(self.cursor).await?;
        let sink_url = self.streaming.sink_url(&slug);

        match self.play(&media, &sink_url).await {
            Ok(source) => debug!(
                "Channel {} finished {} from {}",
                self.channel.id(),
                media,
                source.as_str()
            ),
            Err(e) => warn!(
                "Channel {} failed to play {}: {}",
                self.channel.id(),
                media,
                e
            ),
        }

        self.cursor = self.channel.next_cursor(index).await;
        Some(media)
    }

    /// Push one entry to `sink_url`, preferring the cached copy.
    pub async fn play(
        &self,
        media: &MediaRef,
        sink_url: &str,
    ) -> Result<PlaySource, ExternalProcessError> {
        let path = self.cache.path_for(media);
        let (source, result) = if self.cache.contains(media).await {
            info!(
                "Streaming channel {} entry {} from file",
                self.channel.id(),
                media
            );
            let result = self
                .transcoder
                .transcode_from_file(&path, sink_url)
                .await;
            (PlaySource::Cache, result)
        } else {
            let resolved = self.extractor.resolve_stream_url(media).await;
            metrics::RESOLUTIONS_TOTAL
                .with_label_values(&[metrics::result_label(&resolved)])
                .inc();
            let resolved = resolved?;
            info!(
                "Streaming channel {} entry {} ({}) from remote",
                self.channel.id(),
                media,
                resolved.title
            );
            let result = self
                .transcoder
                .transcode_from_remote(&resolved.playable_url, sink_url)
                .await;
            (PlaySource::Remote, result)
        };

        metrics::TRANSCODES_TOTAL
            .with_label_values(&[source.as_str(), metrics::result_label(&result)])
            .inc();
        result?;
        Ok(source)
    }

    /// Run until shutdown. An in-flight transcode is allowed to finish.
    pub async fn run(mut self, mut shutdown: ShutdownSignal) {
        let id = self.channel.id();
        info!(
            "Playback loop started for channel {} under {}",
            id, self.streaming.sink_root_url
        );
        metrics::PLAYBACK_LOOPS_ACTIVE.inc();

        while !shutdown.is_shutdown() {
            if self.step().await.is_some() {
                self.backoff.reset();
                continue;
            }

            let wait = self.backoff.next();
            debug!("Channel {} has an empty playlist, waiting up to {:?}", id, wait);
            tokio::select! {
                _ = shutdown.recv() => break,
                _ = self.channel.populated() => {}
                _ = tokio::time::sleep(wait) => {}
            }
        }

        metrics::PLAYBACK_LOOPS_ACTIVE.dec();
        info!("Playback loop stopped for channel {}", id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supervisor::Supervisor;
    use crate::testing::{MockExtractor, MockTranscoder, TranscodeInput};
    use tempfile::TempDir;

    fn refs(urls: &[&str]) -> Vec<MediaRef> {
        urls.iter().map(|u| MediaRef::from(*u)).collect()
    }

    struct Fixture {
        dir: TempDir,
        channel: Arc<Channel>,
        transcoder: Arc<MockTranscoder>,
        extractor: Arc<MockExtractor>,
    }

    impl Fixture {
        fn new(urls: &[&str]) -> Self {
            Self {
                dir: TempDir::new().unwrap(),
                channel: Arc::new(Channel::new(1, "one", "one", false, refs(urls))),
                transcoder: Arc::new(MockTranscoder::new()),
                extractor: Arc::new(MockExtractor::new()),
            }
        }

        fn cache(&self) -> MediaCache {
            MediaCache::new(self.dir.path(), "mp4")
        }

        fn playback(&self) -> PlaybackLoop {
            PlaybackLoop::new(
                Arc::clone(&self.channel),
                StreamingConfig {
                    disabled: false,
                    sink_root_url: "rtmp://sink/hls".to_string(),
                },
                self.cache(),
                self.transcoder.clone(),
                self.extractor.clone(),
            )
        }
    }

    #[tokio::test]
    async fn test_round_robin() {
        let fixture = Fixture::new(&["a", "b", "c"]);
        let mut playback = fixture.playback();

        let mut played = Vec::new();
        for _ in 0..7 {
            played.push(playback.step().await.unwrap());
        }
        assert_eq!(played, refs(&["a", "b", "c", "a", "b", "c", "a"]));
    }

    #[tokio::test]
    async fn test_prefers_cached_file() {
        let fixture = Fixture::new(&["a", "b"]);
        let cached = fixture.cache().path_for(&MediaRef::from("a"));
        std::fs::write(&cached, b"media").unwrap();
        let mut playback = fixture.playback();

        playback.step().await;
        playback.step().await;

        let calls = fixture.transcoder.recorded_transcodes().await;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].input, TranscodeInput::File(cached));
        assert_eq!(
            calls[1].input,
            TranscodeInput::Remote(fixture.extractor.playable_url_for(&MediaRef::from("b")))
        );
        assert!(calls.iter().all(|c| c.sink_url == "rtmp://sink/hls/one"));
        assert_eq!(fixture.extractor.call_count().await, 1);
    }

    #[tokio::test]
    async fn test_errors_advance_without_retry() {
        let fixture = Fixture::new(&["a", "b"]);
        fixture.extractor.fail_for(&MediaRef::from("a")).await;
        fixture
            .transcoder
            .fail_for(&fixture.extractor.playable_url_for(&MediaRef::from("b")))
            .await;
        let mut playback = fixture.playback();

        let played = vec![
            playback.step().await.unwrap(),
            playback.step().await.unwrap(),
            playback.step().await.unwrap(),
        ];
        assert_eq!(played, refs(&["a", "b", "a"]));
        assert_eq!(fixture.extractor.call_count().await, 3);
    }

    #[tokio::test]
    async fn test_replacement_is_all_old_or_all_new() {
        let fixture = Fixture::new(&["o1", "o2", "o3"]);
        let mut playback = fixture.playback();

        assert_eq!(playback.step().await.unwrap().as_str(), "o1");
        fixture
            .channel
            .replace("renamed", refs(&["n1", "n2"]))
            .await;

        let played: Vec<MediaRef> = [
            playback.step().await.unwrap(),
            playback.step().await.unwrap(),
            playback.step().await.unwrap(),
        ]
        .to_vec();
        // Cursor 1 taken modulo the new length.
        assert_eq!(played, refs(&["n2", "n1", "n2"]));
        assert_eq!(fixture.channel.name().await, "renamed");
    }

    #[tokio::test]
    async fn test_sink_follows_slug_change() {
        let fixture = Fixture::new(&["a", "b"]);
        let mut playback = fixture.playback();

        playback.step().await;
        let renamed = Channel::new(1, "one", "renamed", false, refs(&["a", "b"]));
        fixture.channel.overwrite_from(&renamed).await;
        playback.step().await;

        let sinks: Vec<String> = fixture
            .transcoder
            .recorded_transcodes()
            .await
            .into_iter()
            .map(|c| c.sink_url)
            .collect();
        assert_eq!(sinks, vec!["rtmp://sink/hls/one", "rtmp://sink/hls/renamed"]);
    }

    #[tokio::test]
    async fn test_empty_playlist_step_is_none() {
        let fixture = Fixture::new(&[]);
        let mut playback = fixture.playback();
        assert!(playback.step().await.is_none());
        assert_eq!(fixture.transcoder.transcode_count().await, 0);
    }

    #[tokio::test]
    async fn test_run_waits_for_population_without_spinning() {
        let fixture = Fixture::new(&[]);
        let supervisor = Supervisor::new();
        let playback = fixture
            .playback()
            .with_empty_backoff(Duration::from_secs(60), Duration::from_secs(60));
        supervisor.spawn("playback", playback.run(supervisor.shutdown_signal()));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fixture.transcoder.transcode_count().await, 0);

        fixture.channel.replace("one", refs(&["a"])).await;
        fixture
            .transcoder
            .wait_for_transcodes(1, Duration::from_secs(2))
            .await
            .expect("playback resumes after population");

        supervisor.stop();
        assert!(
            supervisor
                .wait_stopped_with_grace(Duration::from_secs(2))
                .await
        );
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let fixture = Fixture::new(&["a", "b"]);
        fixture
            .transcoder
            .set_transcode_duration(Duration::from_millis(5))
            .await;
        let supervisor = Supervisor::new();
        supervisor.spawn(
            "playback",
            fixture.playback().run(supervisor.shutdown_signal()),
        );

        fixture
            .transcoder
            .wait_for_transcodes(3, Duration::from_secs(2))
            .await
            .unwrap();
        supervisor.stop();
        assert!(
            supervisor
                .wait_stopped_with_grace(Duration::from_secs(2))
                .await
        );

        let calls = fixture.transcoder.recorded_transcodes().await;
        let expected = ["a", "b"];
        for (i, call) in calls.iter().enumerate() {
            let media = MediaRef::from(expected[i % 2]);
            assert_eq!(
                call.input,
                TranscodeInput::Remote(fixture.extractor.playable_url_for(&media))
            );
        }
    }

    #[test]
    fn test_backoff_doubles_to_cap() {
        let mut backoff = EmptyBackoff::new(Duration::from_millis(100), Duration::from_millis(350));
        assert_eq!(backoff.next(), Duration::from_millis(100));
        assert_eq!(backoff.next(), Duration::from_millis(200));
        assert_eq!(backoff.next(), Duration::from_millis(350));
        assert_eq!(backoff.next(), Duration::from_millis(350));
        backoff.reset();
        assert_eq!(backoff.next(), Duration::from_millis(100));
    }
}
