//! JSON endpoints: subject listing, snapshots, and topic toggles.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use pathwise_core::prelude::{Classification, CompletionSet, Snapshot};
use serde::{Deserialize, Serialize};
use tracing::info;

/// List subject names.
pub async fn list_subjects(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.subjects().await?))
}

/// Full snapshot of one subject, without rendering an image.
pub async fn get_subject(
    State(state): State<AppState>,
    Path(subject): Path<String>,
) -> Result<Json<Snapshot>, ApiError> {
    Ok(Json(state.snapshot(&subject).await?))
}

/// Toggle request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub subject: String,
    pub topic: String,
    pub completed: bool,
}

/// Toggle response.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateResponse {
    pub success: bool,
    pub graph_file: String,
    pub image_map: String,
    pub progress: CompletionSet,
    pub states: Classification,
    pub percent: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Set a topic's completion flag, persist it, and re-render the graph.
pub async fn update(
    State(state): State<AppState>,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<UpdateResponse>, ApiError> {
    info!(subject = %req.subject, topic = %req.topic, completed = req.completed, "received update request");

    let snapshot = state.toggle(&req.subject, &req.topic, req.completed).await?;
    let rendered = state.render(&snapshot).await;

    Ok(Json(UpdateResponse {
        success: true,
        graph_file: rendered.graph_file,
        image_map: rendered.image_map,
        progress: snapshot.progress,
        states: snapshot.states,
        percent: snapshot.percent,
        warning: snapshot.warning,
    }))
}
