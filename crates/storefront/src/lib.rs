//! Tienda storefront library.
//!
//! Web storefront for the shop API plus the pieces other front ends share:
//! the API client ([`api`]) and the cart session manager
//! ([`cart_session`]), which keeps a visitor's cart ID consistent with the
//! carts the API actually holds.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart_session;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;

use axum::{
    Router,
    http::{Request, Uri},
    routing::get,
};
use tower_http::trace::TraceLayer;

use error::AppError;
use state::AppState;

/// Build the storefront router with sessions, tracing and request IDs.
///
/// Sentry layers are left to the binary so tests can run without a client.
pub fn router(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes::routes())
        .fallback(not_found)
        .layer(session_layer)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the shop API.
async fn health() -> &'static str {
    "ok"
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
