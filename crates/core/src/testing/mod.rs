//! Testing utilities and mock implementations.
//!
//! Every external collaborator of the orchestrator has a controllable mock
//! here, so the engine can be driven end to end without ffmpeg, yt-dlp, the
//! network or a control plane.
//!
//! # Example
//!
//! ```rust,ignore
//! use restreamer_core::testing::{fixtures, MockSet};
//! use restreamer_core::Orchestrator;
//!
//! let mocks = MockSet::new();
//! mocks.provider.set_specs(vec![fixtures::channel_spec(1, &["x", "y"])]).await;
//!
//! let orchestrator = Orchestrator::new(&fixtures::config(dir.path()), mocks.collaborators());
//! orchestrator.bootstrap().await?;
//! ```

mod mock_extractor;
mod mock_provider;
mod mock_search;
mod mock_transcoder;
mod mock_transfer;

pub use mock_extractor::MockExtractor;
pub use mock_provider::MockSpecProvider;
pub use mock_search::{MockSearchProvider, RecordedSearch, SearchKind};
pub use mock_transcoder::{MockTranscoder, RecordedTranscode, TranscodeInput};
pub use mock_transfer::{MockTransfer, RecordedFetch};

use std::sync::Arc;

use crate::orchestrator::Collaborators;

/// One mock of every collaborator, kept around for assertions.
#[derive(Debug, Clone, Default)]
pub struct MockSet {
    pub provider: Arc<MockSpecProvider>,
    pub transcoder: Arc<MockTranscoder>,
    pub extractor: Arc<MockExtractor>,
    pub transfer: Arc<MockTransfer>,
    pub search: Arc<MockSearchProvider>,
}

impl MockSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trait-object view handed to the orchestrator.
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            provider: self.provider.clone(),
            transcoder: self.transcoder.clone(),
            extractor: self.extractor.clone(),
            transfer: self.transfer.clone(),
            search: self.search.clone(),
        }
    }
}

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;

    use crate::channel::{AutoSpec, ChannelId, ChannelSpec, StreamLink};
    use crate::config::{load_config_from_str, Config};
    use crate::search::SearchItem;

    /// A valid config storing its cache under `storage_root`, with short
    /// empty-playlist waits.
    pub fn config(storage_root: &Path) -> Config {
        let toml = format!(
            r#"
            [search]
            api_key = "test-key"

            [storage]
            root_path = "{}"

            [streaming]
            sink_root_url = "rtmp://sink.test/hls"

            [orchestrator]
            empty_playlist_backoff_ms = 10
            max_empty_playlist_backoff_ms = 50
            shutdown_grace_secs = 2
            "#,
            storage_root.display().to_string().replace('\\', "\\\\")
        );
        load_config_from_str(&toml).expect("fixture config is valid")
    }

    /// `count` video hits with ids `{prefix}-{i}`.
    pub fn videos(prefix: &str, count: usize) -> Vec<SearchItem> {
        (0..count)
            .map(|i| SearchItem::video(format!("{}-{}", prefix, i)))
            .collect()
    }

    /// A plain channel spec with the given links.
    pub fn channel_spec(id: ChannelId, links: &[&str]) -> ChannelSpec {
        ChannelSpec {
            id,
            name: format!("Channel {}", id),
            slug: format!("channel-{}", id),
            links: links
                .iter()
                .map(|url| StreamLink {
                    url: url.to_string(),
                })
                .collect(),
            keywords: String::new(),
            channels: String::new(),
            update_frequency_secs: 0,
            is_news: false,
        }
    }

    /// An auto spec searching `keywords` and `channels`.
    pub fn auto_spec(
        id: ChannelId,
        keywords: &str,
        channels: &str,
        update_frequency_secs: i64,
    ) -> AutoSpec {
        AutoSpec {
            id,
            name: format!("Auto {}", id),
            slug: format!("auto-{}", id),
            keywords: keywords.to_string(),
            channels: channels.to_string(),
            update_frequency_secs,
            is_news: false,
        }
    }

    /// The channel spec form of [`auto_spec`], as sent by the control plane.
    pub fn auto_channel_spec(
        id: ChannelId,
        keywords: &str,
        channels: &str,
        update_frequency_secs: i64,
    ) -> ChannelSpec {
        let auto = auto_spec(id, keywords, channels, update_frequency_secs);
        ChannelSpec {
            id,
            name: auto.name,
            slug: auto.slug,
            links: Vec::new(),
            keywords: auto.keywords,
            channels: auto.channels,
            update_frequency_secs,
            is_news: false,
        }
    }
}
