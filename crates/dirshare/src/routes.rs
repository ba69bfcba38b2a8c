use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::ServeState;
use crate::handlers;

/// Routes for browsing the served directory
pub fn serve_routes() -> Router<ServeState> {
    Router::new()
        // Served root listing
        .route("/", get(handlers::index))
        // Files, sub-directories and the favicon at any depth
        .route("/{*path}", get(handlers::serve_path))
}

/// The complete application for one listener.
pub fn router(state: ServeState) -> Router {
    serve_routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
