//! Control surface tests driven through the real router.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use common::{fixtures, TestConfig, TestFixture};

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_redacts_api_key() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/config").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["search"]["api_key_configured"], true);
    assert!(!response.body.to_string().contains("test-key"));
    assert_eq!(
        response.body["streaming"]["sink_root_url"],
        "rtmp://sink.test/hls"
    );
}

#[tokio::test]
async fn test_add_stream_registers_and_downloads() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/stream/add",
            json!({
                "id": 1,
                "name": "News",
                "slug": "news",
                "links": [{"url": "https://youtube.com/watch?v=a"}, {"url": "https://youtube.com/watch?v=b"}]
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["message"].as_str().unwrap().contains('1'));

    let channels = fixture.get("/channels").await;
    assert_eq!(channels.body.as_array().unwrap().len(), 1);
    assert_eq!(channels.body[0]["slug"], "news");
    assert_eq!(channels.body[0]["entries"], 2);
    assert_eq!(channels.body[0]["is_auto"], false);

    fixture.wait_for_fetches(2).await;
    fixture.shutdown().await;
}

#[tokio::test]
async fn test_update_unknown_stream_is_404() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/stream/update",
            json!({"id": 9, "name": "Ghost", "links": [{"url": "z"}]}),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.body["error"].as_str().unwrap().contains('9'));
    assert_eq!(fixture.mocks.transfer.fetch_count().await, 0);
}

#[tokio::test]
async fn test_update_stream_replaces_playlist() {
    let fixture = TestFixture::new().await;
    let spec = serde_json::to_value(fixtures::channel_spec(2, &["a"])).unwrap();
    assert_eq!(fixture.post("/stream/add", spec).await.status, StatusCode::OK);

    let mut updated = serde_json::to_value(fixtures::channel_spec(2, &["b", "c", "d"])).unwrap();
    updated["name"] = json!("Renamed");
    let response = fixture.post("/stream/update", updated).await;
    assert_eq!(response.status, StatusCode::OK);

    let channel = fixture.get("/channels/2").await;
    assert_eq!(channel.status, StatusCode::OK);
    assert_eq!(channel.body["name"], "Renamed");
    assert_eq!(channel.body["entries"], 3);
    fixture.shutdown().await;
}

#[tokio::test]
async fn test_add_auto_stream_builds_playlist() {
    let fixture = TestFixture::new().await;
    fixture
        .mocks
        .search
        .set_keyword_results("cats", fixtures::videos("cat", 3))
        .await;

    let response = fixture
        .post(
            "/stream/add",
            serde_json::to_value(fixtures::auto_channel_spec(5, "cats", "", 60)).unwrap(),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let channel = fixture.get("/channels/5").await;
    assert_eq!(channel.body["is_auto"], true);
    assert_eq!(channel.body["entries"], 3);
    // Auto channels are not cached.
    assert_eq!(fixture.mocks.transfer.fetch_count().await, 0);
    fixture.shutdown().await;
}

#[tokio::test]
async fn test_add_auto_stream_without_results_is_422() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/stream/add",
            serde_json::to_value(fixtures::auto_channel_spec(5, "nothing", "", 60)).unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(fixture.get("/channels/5").await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_auto_stream_with_bad_frequency_is_422() {
    let fixture = TestFixture::new().await;
    fixture
        .mocks
        .search
        .set_keyword_results("cats", fixtures::videos("cat", 2))
        .await;
    let add = serde_json::to_value(fixtures::auto_channel_spec(5, "cats", "", 60)).unwrap();
    assert_eq!(fixture.post("/stream/add", add).await.status, StatusCode::OK);

    let update = serde_json::to_value(fixtures::auto_channel_spec(5, "cats", "", 0)).unwrap();
    let response = fixture.post("/stream/update", update).await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    let status = fixture.get("/status").await;
    assert_eq!(status.body["refreshing"], 0);
    fixture.shutdown().await;
}

#[tokio::test]
async fn test_malformed_spec_is_rejected() {
    let fixture = TestFixture::new().await;

    let response = fixture.post("/stream/add", json!({"name": "no id"})).await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(fixture.get("/status").await.body["channels"], 0);
}

#[tokio::test]
async fn test_added_stream_is_played() {
    let fixture = TestFixture::with_config(TestConfig { streaming: true }).await;
    let spec = serde_json::to_value(fixtures::channel_spec(3, &["x"])).unwrap();

    assert_eq!(fixture.post("/stream/add", spec).await.status, StatusCode::OK);
    fixture
        .mocks
        .transcoder
        .wait_for_transcodes(2, Duration::from_secs(5))
        .await
        .expect("channel is played");

    let status = fixture.get("/status").await;
    assert_eq!(status.body["playing"], 1);
    assert_eq!(status.body["running"], true);
    fixture.shutdown().await;

    let calls = fixture.mocks.transcoder.recorded_transcodes().await;
    assert!(calls
        .iter()
        .all(|c| c.sink_url == "rtmp://sink.test/hls/channel-3"));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.get("/health").await;

    let (status, text) = fixture.get_text("/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(text.contains("restreamer_http_requests_total"));
    assert!(text.contains("restreamer_orchestrator_running"));
}
