//! Concurrent keyed store of channels.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::types::{Channel, ChannelId};

/// Registry of live channels.
///
/// The lock only covers structural map operations; channel content is
/// guarded by each channel's own lock.
#[derive(Debug, Default)]
pub struct Registry {
    channels: RwLock<HashMap<ChannelId, Arc<Channel>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a channel under its id, returning the previous one.
    pub async fn put(&self, channel: Arc<Channel>) -> Option<Arc<Channel>> {
        self.channels.write().await.insert(channel.id(), channel)
    }

    /// Insert `channel` unless its id is taken.
    ///
    /// Returns the registered channel and whether it is the one just inserted.
    pub async fn get_or_insert(&self, channel: Arc<Channel>) -> (Arc<Channel>, bool) {
        let mut channels = self.channels.write().await;
        match channels.get(&channel.id()) {
            Some(existing) => (Arc::clone(existing), false),
            None => {
                channels.insert(channel.id(), Arc::clone(&channel));
                (channel, true)
            }
        }
    }

    pub async fn get(&self, id: ChannelId) -> Option<Arc<Channel>> {
        self.channels.read().await.get(&id).cloned()
    }

    pub async fn contains(&self, id: ChannelId) -> bool {
        self.channels.read().await.contains_key(&id)
    }

    /// All channels, ordered by id.
    pub async fn snapshot(&self) -> Vec<Arc<Channel>> {
        let mut channels: Vec<_> = self.channels.read().await.values().cloned().collect();
        channels.sort_by_key(|c| c.id());
        channels
    }

    /// Visit every channel of a snapshot. The map lock is released before
    /// `f` runs, so `f` may call back into the registry.
    pub async fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&Arc<Channel>),
    {
        for channel in self.snapshot().await {
            f(&channel);
        }
    }

    pub async fn len(&self) -> usize {
        self.channels.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.channels.read().await.is_empty()
    }
}
