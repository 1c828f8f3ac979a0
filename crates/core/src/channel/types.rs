//! Channel entity and the spec shapes it is built from.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Notify, RwLock};

/// Channel identifier as assigned by the control plane.
pub type ChannelId = i64;

/// An opaque source URL. Immutable once it is part of a playlist snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaRef(String);

impl MediaRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MediaRef {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for MediaRef {
    fn from(url: String) -> Self {
        Self(url)
    }
}

/// A link entry as sent by the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamLink {
    pub url: String,
}

/// Channel spec as produced by the control plane and the HTTP control surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSpec {
    pub id: ChannelId,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub links: Vec<StreamLink>,
    /// Comma-separated search keywords.
    #[serde(default)]
    pub keywords: String,
    /// Comma-separated channel handles.
    #[serde(default)]
    pub channels: String,
    #[serde(default, rename = "update_frequency")]
    pub update_frequency_secs: i64,
    #[serde(default)]
    pub is_news: bool,
}

impl ChannelSpec {
    /// A spec with keywords or channel handles has its playlist synthesized
    /// from search results instead of `links`.
    pub fn is_auto(&self) -> bool {
        !self.keywords.trim().is_empty() || !self.channels.trim().is_empty()
    }

    pub fn playlist(&self) -> Vec<MediaRef> {
        self.links
            .iter()
            .map(|link| MediaRef::new(link.url.clone()))
            .collect()
    }

    pub fn to_channel(&self) -> Channel {
        Channel::new(
            self.id,
            self.name.clone(),
            self.slug.clone(),
            self.is_auto(),
            self.playlist(),
        )
    }

    pub fn auto_spec(&self) -> AutoSpec {
        AutoSpec {
            id: self.id,
            name: self.name.clone(),
            slug: self.slug.clone(),
            keywords: self.keywords.clone(),
            channels: self.channels.clone(),
            update_frequency_secs: self.update_frequency_secs,
            is_news: self.is_news,
        }
    }
}

/// Transient input to the auto curator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoSpec {
    pub id: ChannelId,
    pub name: String,
    pub slug: String,
    pub keywords: String,
    pub channels: String,
    pub update_frequency_secs: i64,
    pub is_news: bool,
}

impl AutoSpec {
    pub fn keyword_list(&self) -> impl Iterator<Item = &str> {
        split_list(&self.keywords)
    }

    pub fn channel_handles(&self) -> impl Iterator<Item = &str> {
        split_list(&self.channels)
    }
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Mutable part of a channel, swapped as a whole under the channel lock.
#[derive(Debug, Clone)]
struct ChannelContent {
    name: String,
    slug: String,
    is_auto: bool,
    playlist: Arc<[MediaRef]>,
}

/// The entry under a playback cursor, read together with the sink slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub index: usize,
    pub media: MediaRef,
    pub slug: String,
}

/// Serializable view of a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub id: ChannelId,
    pub name: String,
    pub slug: String,
    pub is_auto: bool,
    pub entries: usize,
}

/// A named output stream fed by a cyclic playlist.
///
/// Only the `id` is fixed; everything else lives behind the channel's own
/// lock. Critical sections only copy or swap the content, never perform I/O.
#[derive(Debug)]
pub struct Channel {
    id: ChannelId,
    content: RwLock<ChannelContent>,
    populated: Notify,
}

impl Channel {
    pub fn new(
        id: ChannelId,
        name: impl Into<String>,
        slug: impl Into<String>,
        is_auto: bool,
        playlist: Vec<MediaRef>,
    ) -> Self {
        Self {
            id,
            content: RwLock::new(ChannelContent {
                name: name.into(),
                slug: slug.into(),
                is_auto,
                playlist: playlist.into(),
            }),
            populated: Notify::new(),
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub async fn slug(&self) -> String {
        self.content.read().await.slug.clone()
    }

    pub async fn is_auto(&self) -> bool {
        self.content.read().await.is_auto
    }

    pub async fn name(&self) -> String {
        self.content.read().await.name.clone()
    }

    /// Current playlist snapshot.
    pub async fn playlist(&self) -> Arc<[MediaRef]> {
        Arc::clone(&self.content.read().await.playlist)
    }

    /// Entry at `cursor`, taken modulo the current length.
    ///
    /// Returns the effective index with the entry, or `None` when the
    /// playlist is empty.
    pub async fn entry_at(&self, cursor: usize) -> Option<(usize, MediaRef)> {
        self.cue(cursor).await.map(|cue| (cue.index, cue.media))
    }

    /// Like [`entry_at`](Self::entry_at), with the slug read under the
    /// same lock.
    pub async fn cue(&self, cursor: usize) -> Option<Cue> {
        let content = self.content.read().await;
        let len = content.playlist.len();
        if len == 0 {
            return None;
        }
        let index = cursor % len;
        Some(Cue {
            index,
            media: content.playlist[index].clone(),
            slug: content.slug.clone(),
        })
    }

    /// Index following `cursor`, wrapping at the current length.
    pub async fn next_cursor(&self, cursor: usize) -> usize {
        let len = self.content.read().await.playlist.len();
        if len == 0 {
            0
        } else {
            (cursor + 1) % len
        }
    }

    /// Atomically replace name and playlist.
    pub async fn replace(&self, name: impl Into<String>, playlist: Vec<MediaRef>) {
        let populated = !playlist.is_empty();
        {
            let mut content = self.content.write().await;
            content.name = name.into();
            content.playlist = playlist.into();
        }
        if populated {
            self.populated.notify_one();
        }
    }

    /// Take over everything but the id from `other`, in one swap.
    pub async fn overwrite_from(&self, other: &Channel) {
        let incoming = other.content.read().await.clone();
        let populated = !incoming.playlist.is_empty();
        *self.content.write().await = incoming;
        if populated {
            self.populated.notify_one();
        }
    }

    /// Resolves once the playlist was replaced by a non-empty one.
    ///
    /// A replacement made while nobody waits is remembered, so the next
    /// waiter returns immediately.
    pub async fn populated(&self) {
        self.populated.notified().await
    }

    pub async fn summary(&self) -> ChannelSummary {
        let content = self.content.read().await;
        ChannelSummary {
            id: self.id,
            name: content.name.clone(),
            slug: content.slug.clone(),
            is_auto: content.is_auto,
            entries: content.playlist.len(),
        }
    }
}
