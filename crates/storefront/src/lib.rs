//! Session Cart Storefront library.
//!
//! Serves the session-scoped cart over a JSON API. The router is exposed as a
//! library so it can be tested without binding a socket.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod storage;

use axum::{Router, http::Request};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router with all middleware attached.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    Router::new()
        .merge(routes::routes())
        .layer(session_layer)
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
}
