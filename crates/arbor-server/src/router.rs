use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all query and admin endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/root", get(handler::root_handler))
        .route("/path/:index", get(handler::path_by_index_handler))
        .route(
            "/path/commitment/:commitment",
            get(handler::path_by_commitment_handler),
        )
        .route("/health", get(handler::health_handler))
        .route("/pending-roots", get(handler::pending_roots_handler))
        .route("/submit-root", post(handler::submit_root_handler))
        .route("/submit-all-roots", post(handler::submit_all_roots_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
