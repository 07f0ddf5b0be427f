//! HealthCompanion web application library.
//!
//! The router is built here so the binary and the integration tests serve
//! exactly the same application.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod i18n;
pub mod identity;
pub mod layout;
pub mod mail;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::from_fn,
    routing::get,
};
use tower::Layer;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::state::AppState;

/// Directory served under `/static`.
pub const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Build the application router.
///
/// Page routes sit behind the locale middleware, which must run before
/// routing, so they are mounted as the fallback service of an outer router
/// that owns the unlocalized routes (health, API, static files).
pub fn app(state: AppState) -> Router {
    let pages = routes::page_routes(state.clone()).with_state(state.clone());
    let localized = from_fn(middleware::locale_middleware).layer(pages);

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::api_routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .with_state(state)
        .fallback_service(localized)
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
                locale = tracing::field::Empty,
            )
        }))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the identity provider is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.identity().health().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Identity provider health check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
