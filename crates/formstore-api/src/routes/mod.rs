use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{handlers, state::ApiState};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn create_router(state: ApiState) -> Router {
    create_router_with_upload_limit(state, DEFAULT_MAX_UPLOAD_BYTES)
}

pub fn create_router_with_upload_limit(state: ApiState, max_upload_bytes: usize) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health::health_check))

        // Listing and export
        .route("/storage", get(handlers::storage::index))
        .route(
            "/storage/:identifier",
            get(handlers::storage::show).delete(handlers::storage::delete_all),
        )
        .route("/storage/:identifier/export", get(handlers::storage::export))
        .route("/entries/:id", delete(handlers::storage::delete))

        // Form submissions
        .route("/submissions", post(handlers::submission::submit_unnamed))
        .route("/submissions/:identifier", post(handlers::submission::submit))
        .route(
            "/submissions/:identifier/upload",
            post(handlers::submission::upload),
        )

        // Add state
        .with_state(state)

        .layer(DefaultBodyLimit::max(max_upload_bytes))
        // Forms may be posted from other origins
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
