//! Read-only views of the registry and orchestrator.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use restreamer_core::{ChannelId, ChannelSummary, OrchestratorStatus};

use crate::state::AppState;

/// Error response
#[derive(Debug, Serialize)]
pub struct ChannelErrorResponse {
    pub error: String,
}

/// List registered channels
pub async fn list_channels(State(state): State<Arc<AppState>>) -> Json<Vec<ChannelSummary>> {
    Json(state.orchestrator().channel_summaries().await)
}

/// Get one channel by id
pub async fn get_channel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ChannelId>,
) -> Result<Json<ChannelSummary>, (StatusCode, Json<ChannelErrorResponse>)> {
    match state.orchestrator().registry().get(id).await {
        Some(channel) => Ok(Json(channel.summary().await)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ChannelErrorResponse {
                error: format!("Channel not found: {}", id),
            }),
        )),
    }
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<OrchestratorStatus> {
    Json(state.orchestrator().status().await)
}
