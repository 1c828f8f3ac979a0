//! In-process test fixture for the control surface.
//!
//! Builds the real router over an orchestrator whose collaborators are all
//! mocks, so requests can be driven with `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use restreamer_core::{testing::MockSet, AutoCurator, Orchestrator};
use restreamer_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use restreamer_core::testing::fixtures;

/// Test fixture holding the router, the mocks and the cache directory.
pub struct TestFixture {
    pub router: Router,
    pub mocks: MockSet,
    pub orchestrator: Orchestrator,
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Options for building a fixture.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestConfig {
    /// Run playback loops against the mock transcoder.
    pub streaming: bool,
}

impl TestFixture {
    /// Create a fixture in cache-only mode.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mocks = MockSet::new();
        mocks
            .transcoder
            .set_transcode_duration(Duration::from_millis(5))
            .await;

        let mut config = fixtures::config(temp_dir.path());
        config.streaming.disabled = !test_config.streaming;

        let orchestrator = Orchestrator::with_curator(
            &config,
            mocks.collaborators(),
            AutoCurator::with_seed(mocks.search.clone(), 7),
        );
        let state = Arc::new(AppState::new(config, orchestrator.clone()));

        Self {
            router: create_router(state),
            mocks,
            orchestrator,
            temp_dir,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// GET returning the raw body text.
    pub async fn get_text(&self, uri: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&bytes).to_string())
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse { status, body }
    }

    /// Poll until the mock transfer has seen `count` fetches.
    pub async fn wait_for_fetches(&self, count: usize) {
        for _ in 0..200 {
            if self.mocks.transfer.fetch_count().await >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {} fetches", count);
    }

    /// Stop the orchestrator and wait for its tasks.
    pub async fn shutdown(&self) {
        self.orchestrator.stop();
        assert!(self.orchestrator.wait_stopped_with_grace().await);
    }
}
