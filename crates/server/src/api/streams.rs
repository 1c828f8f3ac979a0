//! Add/update entry points used by the control plane.
//!
//! Both take a JSON [`ChannelSpec`]. Specs carrying keywords or channel
//! handles are routed to the auto-channel operations; the rest are plain
//! channels whose cache is filled in the background.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use restreamer_core::{ChannelSpec, OrchestratorError};

use crate::state::AppState;

/// Simple message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct StreamErrorResponse {
    pub error: String,
}

type StreamResult = Result<Json<MessageResponse>, (StatusCode, Json<StreamErrorResponse>)>;

/// Register a new channel and start serving it.
pub async fn add_stream(
    State(state): State<Arc<AppState>>,
    Json(spec): Json<ChannelSpec>,
) -> StreamResult {
    let orchestrator = state.orchestrator();
    info!("Add request for channel {} ({})", spec.id, spec.name);

    if spec.is_auto() {
        let channel = orchestrator
            .add_auto_channel(&spec.auto_spec())
            .await
            .map_err(error_response)?;
        return Ok(message(format!(
            "Auto channel {} added with {} entries",
            spec.id,
            channel.playlist().await.len()
        )));
    }

    orchestrator.add_channel(spec.to_channel(), true).await;
    Ok(message(format!("Channel {} added", spec.id)))
}

/// Replace the name and playlist of a registered channel.
pub async fn update_stream(
    State(state): State<Arc<AppState>>,
    Json(spec): Json<ChannelSpec>,
) -> StreamResult {
    let orchestrator = state.orchestrator();
    info!("Update request for channel {} ({})", spec.id, spec.name);

    if spec.is_auto() {
        orchestrator
            .update_auto_channel(&spec.auto_spec())
            .await
            .map_err(error_response)?;
    } else {
        orchestrator
            .update_channel(&spec, true)
            .await
            .map_err(error_response)?;
    }
    Ok(message(format!("Channel {} updated", spec.id)))
}

fn message(message: String) -> Json<MessageResponse> {
    Json(MessageResponse { message })
}

fn error_response(err: OrchestratorError) -> (StatusCode, Json<StreamErrorResponse>) {
    let status = match &err {
        OrchestratorError::ChannelNotFound(_) => StatusCode::NOT_FOUND,
        OrchestratorError::EmptyPlaylist(_) | OrchestratorError::Validation(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        OrchestratorError::Provider(_) | OrchestratorError::ExternalProcess(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(StreamErrorResponse {
            error: err.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let (status, _) = error_response(OrchestratorError::ChannelNotFound(4));
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = error_response(OrchestratorError::EmptyPlaylist(4));
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = error_response(OrchestratorError::Validation("bad".into()));
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.error.contains("bad"));
    }
}
