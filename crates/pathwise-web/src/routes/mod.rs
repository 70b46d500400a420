//! HTTP routes for the progress tracker.

mod api;
mod pages;

use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub use api::{UpdateRequest, UpdateResponse};

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    let static_dir = state.static_dir().to_path_buf();

    Router::new()
        // Page
        .route("/", get(pages::index))
        // Toggle action used by the page script
        .route("/update", post(api::update))
        // JSON API
        .route("/api/subjects", get(api::list_subjects))
        .route("/api/subjects/:subject", get(api::get_subject))
        // Rendered graph images
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
