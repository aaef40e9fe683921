//! HTTP routes for the dashboard.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health, /health/ready             - Probes
//!
//! # Pages (guarded by route_guard)
//! GET  /                                  - Landing (public)
//! GET  /auth/login, /auth/register        - Auth page context (public)
//! GET  /dashboard                         - Stats and navigation
//! GET  /dashboard/{users,products}        - Collection page with first list page
//! GET  /dashboard/reports                 - Report breakdowns
//! GET  /dashboard/settings                - Account settings
//!
//! # Auth
//! POST /auth/login, /auth/register        - Form or JSON; sets the session cookie
//! POST /auth/logout                       - Clears the session cookie
//! GET  /api/auth/me                       - Current identity
//! PATCH /api/auth/me                      - Update display name / photo
//! POST /api/auth/password                 - Change password
//!
//! # Collections (guarded by the collection's page permissions)
//! /api/users/...    /api/products/...     - See [`records`]
//! ```

pub mod auth;
pub mod extract;
pub mod health;
pub mod pages;
pub mod records;

use axum::{
    Router,
    http::{Request, Response},
    middleware::{from_fn, from_fn_with_state},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::{
    request_id_middleware, resolve_session, route_guard, security_headers_middleware,
};
use crate::models::{ProductRecord, UserRecord};
use crate::state::AppState;

/// Build the full application router.
///
/// Sentry layers are left to the binary so tests can serve this directly.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(pages::router())
        .merge(auth::router())
        .merge(records::router::<UserRecord>())
        .merge(records::router::<ProductRecord>())
        .layer(from_fn_with_state(state.clone(), route_guard))
        .layer(from_fn_with_state(state.clone(), resolve_session))
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        uid = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &Response<_>, latency: std::time::Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}
