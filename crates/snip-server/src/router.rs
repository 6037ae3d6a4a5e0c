use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with all snip endpoints.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/",
            get(handler::shorten_get).post(handler::shorten_post),
        )
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route("/:id", get(handler::redirect))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
