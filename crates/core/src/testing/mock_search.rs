//! Mock search provider for testing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::search::{SearchError, SearchItem, SearchProvider};

/// Which search entry point was called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Keyword,
    ChannelHandle,
}

/// A recorded search for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSearch {
    pub kind: SearchKind,
    pub query: String,
    pub published_after: Option<DateTime<Utc>>,
}

/// Mock implementation of the SearchProvider trait.
///
/// Queries without configured results return nothing.
#[derive(Debug, Clone, Default)]
pub struct MockSearchProvider {
    keyword_results: Arc<RwLock<HashMap<String, Vec<SearchItem>>>>,
    channel_results: Arc<RwLock<HashMap<String, Vec<SearchItem>>>>,
    errors: Arc<RwLock<HashMap<String, SearchError>>>,
    searches: Arc<RwLock<Vec<RecordedSearch>>>,
}

impl MockSearchProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_keyword_results(&self, keyword: &str, items: Vec<SearchItem>) {
        self.keyword_results
            .write()
            .await
            .insert(keyword.to_string(), items);
    }

    pub async fn set_channel_results(&self, handle: &str, items: Vec<SearchItem>) {
        self.channel_results
            .write()
            .await
            .insert(handle.to_string(), items);
    }

    /// Fail the next search for `query` (keyword or handle) with `error`.
    pub async fn fail_query(&self, query: &str, error: SearchError) {
        self.errors.write().await.insert(query.to_string(), error);
    }

    pub async fn recorded_searches(&self) -> Vec<RecordedSearch> {
        self.searches.read().await.clone()
    }

    pub async fn search_count(&self) -> usize {
        self.searches.read().await.len()
    }

    async fn search(
        &self,
        kind: SearchKind,
        query: &str,
        published_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<SearchItem>, SearchError> {
        self.searches.write().await.push(RecordedSearch {
            kind,
            query: query.to_string(),
            published_after,
        });

        if let Some(error) = self.errors.write().await.remove(query) {
            return Err(error);
        }

        let results = match kind {
            SearchKind::Keyword => &self.keyword_results,
            SearchKind::ChannelHandle => &self.channel_results,
        };
        Ok(results.read().await.get(query).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl SearchProvider for MockSearchProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search_by_keyword(
        &self,
        query: &str,
        published_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<SearchItem>, SearchError> {
        self.search(SearchKind::Keyword, query, published_after)
            .await
    }

    async fn search_by_channel_handle(
        &self,
        handle: &str,
        published_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<SearchItem>, SearchError> {
        self.search(SearchKind::ChannelHandle, handle, published_after)
            .await
    }
}
