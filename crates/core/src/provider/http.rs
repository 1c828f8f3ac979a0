use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{ProviderError, SpecProvider};
use crate::channel::ChannelSpec;
use crate::config::ControlPlaneConfig;

/// Fetches specs from `GET {url}/api/streams/`.
pub struct HttpSpecProvider {
    client: Client,
    endpoint: String,
}

impl HttpSpecProvider {
    pub fn new(config: &ControlPlaneConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        Ok(Self {
            client,
            endpoint: streams_endpoint(&config.url),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn streams_endpoint(base: &str) -> String {
    format!("{}/api/streams/", base.trim_end_matches('/'))
}

#[async_trait]
impl SpecProvider for HttpSpecProvider {
    async fn fetch_specs(&self) -> Result<Vec<ChannelSpec>, ProviderError> {
        debug!("Fetching channel specs from {}", self.endpoint);

        let response = self.client.get(&self.endpoint).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        parse_specs(&body)
    }
}

fn parse_specs(body: &str) -> Result<Vec<ChannelSpec>, ProviderError> {
    serde_json::from_str(body).map_err(|e| ProviderError::ParseError(e.to_string()))
}
