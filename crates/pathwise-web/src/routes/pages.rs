//! HTML page endpoint.

use crate::error::ApiError;
use crate::page::render_page;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::response::Html;
use serde::Deserialize;
use tracing::info;

/// Query string for `/`.
#[derive(Debug, Deserialize)]
pub struct IndexQuery {
    pub subject: Option<String>,
}

/// Render the page for the selected subject, defaulting to the first one.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<IndexQuery>,
) -> Result<Html<String>, ApiError> {
    let subjects = state.subjects().await?;
    let Some(first) = subjects.first() else {
        return Err(ApiError::NoSubjects);
    };
    let selected = query.subject.unwrap_or_else(|| first.clone());

    info!(subject = %selected, "rendering index page");
    let snapshot = state.snapshot(&selected).await?;
    let rendered = state.render(&snapshot).await;

    Ok(Html(render_page(
        &subjects,
        &snapshot,
        &rendered,
        state.map_name(),
    )))
}
