use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{channels, handlers, middleware::metrics_middleware, streams};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Control plane entry points
        .route("/stream/add", post(streams::add_stream))
        .route("/stream/update", post(streams::update_stream))
        // Introspection
        .route("/channels", get(channels::list_channels))
        .route("/channels/{id}", get(channels::get_channel))
        .route("/status", get(channels::get_status))
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::get_metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
