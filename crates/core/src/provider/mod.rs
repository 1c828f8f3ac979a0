//! Control-plane channel spec source.
//!
//! The orchestrator fetches every channel spec once at startup through the
//! `SpecProvider` trait.

mod http;

pub use http::HttpSpecProvider;

use async_trait::async_trait;
use thiserror::Error;

use crate::channel::ChannelSpec;

/// Errors that can occur when fetching channel specs.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Control plane returned {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse channel specs: {0}")]
    ParseError(String),
}

/// Source of channel specs.
#[async_trait]
pub trait SpecProvider: Send + Sync {
    /// Fetch every channel spec the control plane knows about.
    async fn fetch_specs(&self) -> Result<Vec<ChannelSpec>, ProviderError>;
}
