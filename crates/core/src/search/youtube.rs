//! YouTube Data API v3 client.
//!
//! Requires an API key. Every search call costs quota, so the curator only
//! hits it when a playlist is (re)built.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tracing::debug;

use super::types::{SearchError, SearchItem, SearchProvider};
use crate::config::SearchConfig;

/// YouTube search backend.
pub struct YoutubeSearchProvider {
    client: Client,
    base_url: String,
    api_key: String,
    max_results: u32,
}

impl YoutubeSearchProvider {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        if config.api_key.is_empty() {
            return Err(SearchError::NotConfigured(
                "YouTube API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            max_results: config.max_results,
        })
    }

    fn search_request(&self, published_after: Option<DateTime<Utc>>) -> RequestBuilder {
        let url = format!("{}/search", self.base_url);
        let mut request = self.client.get(&url).query(&[
            ("part", "id,snippet"),
            ("order", "date"),
            ("key", self.api_key.as_str()),
        ]);
        request = request.query(&[("maxResults", self.max_results)]);
        if let Some(after) = published_after {
            request = request.query(&[(
                "publishedAfter",
                after.to_rfc3339_opts(SecondsFormat::Secs, true),
            )]);
        }
        request
    }

    async fn run_search(&self, request: RequestBuilder) -> Result<Vec<SearchItem>, SearchError> {
        let response = check_status(request.send().await?).await?;
        let body: SearchListResponse = response
            .json()
            .await
            .map_err(|e| SearchError::ParseError(format!("search response: {}", e)))?;
        Ok(body.items.into_iter().filter_map(SearchResult::into_item).collect())
    }

    /// Resolve a legacy username to a channel id.
    async fn resolve_channel_id(&self, handle: &str) -> Result<Option<String>, SearchError> {
        let url = format!("{}/channels", self.base_url);
        let request = self.client.get(&url).query(&[
            ("part", "id"),
            ("forUsername", handle),
            ("key", self.api_key.as_str()),
        ]);

        let response = check_status(request.send().await?).await?;
        let body: ChannelListResponse = response
            .json()
            .await
            .map_err(|e| SearchError::ParseError(format!("channel response: {}", e)))?;
        Ok(body.items.into_iter().next().map(|c| c.id))
    }
}

async fn check_status(response: Response) -> Result<Response, SearchError> {
    let status = response.status();
    if status == 401 || status == 403 {
        let body = response.text().await.unwrap_or_default();
        if body.contains("quotaExceeded") || body.contains("rateLimitExceeded") {
            return Err(SearchError::RateLimitExceeded);
        }
        return Err(SearchError::NotConfigured(format!(
            "YouTube rejected the API key: {}",
            body
        )));
    }
    if status == 429 {
        return Err(SearchError::RateLimitExceeded);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SearchError::ApiError {
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(response)
}

#[async_trait]
impl SearchProvider for YoutubeSearchProvider {
    fn name(&self) -> &str {
        "youtube"
    }

    async fn search_by_keyword(
        &self,
        query: &str,
        published_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<SearchItem>, SearchError> {
        debug!("YouTube keyword search: q='{}', after={:?}", query, published_after);
        let request = self.search_request(published_after).query(&[("q", query)]);
        self.run_search(request).await
    }

    async fn search_by_channel_handle(
        &self,
        handle: &str,
        published_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<SearchItem>, SearchError> {
        let channel_id = self
            .resolve_channel_id(handle)
            .await?
            .unwrap_or_else(|| handle.to_string());

        debug!(
            "YouTube channel search: handle='{}', channel={}, after={:?}",
            handle, channel_id, published_after
        );
        let request = self
            .search_request(published_after)
            .query(&[("channelId", channel_id.as_str())]);
        self.run_search(request).await
    }
}

// Wire types

#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    id: SearchResultId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResultId {
    kind: String,
    video_id: Option<String>,
    channel_id: Option<String>,
    playlist_id: Option<String>,
}

impl SearchResult {
    fn into_item(self) -> Option<SearchItem> {
        let kind = self
            .id
            .kind
            .strip_prefix("youtube#")
            .unwrap_or(&self.id.kind)
            .to_string();
        let id = self
            .id
            .video_id
            .or(self.id.channel_id)
            .or(self.id.playlist_id)?;
        Some(SearchItem { kind, id })
    }
}

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelResource>,
}

#[derive(Debug, Deserialize)]
struct ChannelResource {
    id: String,
}
