//! Mock spec provider for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::channel::ChannelSpec;
use crate::provider::{ProviderError, SpecProvider};

/// Mock implementation of the SpecProvider trait.
#[derive(Debug, Clone, Default)]
pub struct MockSpecProvider {
    specs: Arc<RwLock<Vec<ChannelSpec>>>,
    next_error: Arc<RwLock<Option<ProviderError>>>,
    fetches: Arc<RwLock<usize>>,
}

impl MockSpecProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_specs(specs: Vec<ChannelSpec>) -> Self {
        Self {
            specs: Arc::new(RwLock::new(specs)),
            ..Default::default()
        }
    }

    pub async fn set_specs(&self, specs: Vec<ChannelSpec>) {
        *self.specs.write().await = specs;
    }

    /// Configure the next fetch to fail with the given error.
    pub async fn set_next_error(&self, error: ProviderError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn fetch_count(&self) -> usize {
        *self.fetches.read().await
    }
}

#[async_trait]
impl SpecProvider for MockSpecProvider {
    async fn fetch_specs(&self) -> Result<Vec<ChannelSpec>, ProviderError> {
        *self.fetches.write().await += 1;
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        Ok(self.specs.read().await.clone())
    }
}
