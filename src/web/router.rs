//! Router configuration for the bridge HTTP server.

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    asset_fallback, create_message, list_messages, messages_options, unknown_method, AppState,
};
use super::middleware::create_cors_layer;

/// Largest request body accepted, in bytes.
pub const MAX_BODY_BYTES: usize = 16 * 1024;

/// Create the main router.
///
/// `/messages` carries the chat API; every other path serves the companion UI.
/// `get` would answer HEAD implicitly, so HEAD is routed to the rejection.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let router = Router::new()
        .route(
            "/messages",
            get(list_messages)
                .post(create_message)
                .options(messages_options)
                .head(unknown_method)
                .fallback(unknown_method),
        )
        .fallback(asset_fallback)
        .with_state(app_state);

    let router = match create_cors_layer(cors_origins) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
    )
}
