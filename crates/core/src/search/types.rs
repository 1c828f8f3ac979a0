//! Types for the search module.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result kind the curator keeps.
pub const VIDEO_KIND: &str = "video";

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchItem {
    /// Kind of the hit, e.g. `video`, `channel` or `playlist`.
    pub kind: String,
    /// Backend identifier of the hit.
    pub id: String,
}

impl SearchItem {
    pub fn video(id: impl Into<String>) -> Self {
        Self {
            kind: VIDEO_KIND.to_string(),
            id: id.into(),
        }
    }

    pub fn is_video(&self) -> bool {
        self.kind == VIDEO_KIND
    }

    /// Public watch URL for this hit.
    pub fn watch_url(&self) -> String {
        format!("https://youtube.com/watch?v={}", self.id)
    }
}

/// Errors that can occur when querying the search backend.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Search not configured: {0}")]
    NotConfigured(String),
}

/// Video search backend used by the auto-curator.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Name of this backend, for logging.
    fn name(&self) -> &str;

    /// Recent results matching `query`, newest first.
    async fn search_by_keyword(
        &self,
        query: &str,
        published_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<SearchItem>, SearchError>;

    /// Recent uploads of the channel known by `handle`, newest first.
    ///
    /// The handle is resolved as a username first and used as a raw
    /// channel id when that lookup finds nothing.
    async fn search_by_channel_handle(
        &self,
        handle: &str,
        published_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<SearchItem>, SearchError>;
}
