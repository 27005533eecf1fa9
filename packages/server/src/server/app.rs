//! Application setup and router configuration.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Extension},
    routing::post,
    Router,
};
use tower_http::trace::TraceLayer;

use crate::kernel::ServerDeps;
use crate::server::routes::{
    get_command_handler, get_html_handler, post_command_handler, post_html_handler,
    save_selectors_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub server_deps: Arc<ServerDeps>,
}

/// Build the Axum router for the extension mediator and the manual override API
pub fn build_app(server_deps: Arc<ServerDeps>) -> Router {
    // captured pages exceed axum's 2 MiB default
    let capture_limit = DefaultBodyLimit::max(server_deps.max_capture_bytes);
    let state = AppState { server_deps };

    Router::new()
        .route(
            "/extension/{company_id}/command",
            post(post_command_handler).get(get_command_handler),
        )
        .route(
            "/extension/{company_id}/html",
            post(post_html_handler)
                .get(get_html_handler)
                .layer(capture_limit),
        )
        .route("/selectors/{company_id}", post(save_selectors_handler))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}
