//! Route protection.
//!
//! [`route_guard`] protects the dashboard pages and bounces signed-in users
//! away from the public pages. [`require_collection_access`] applies the same
//! permission table to a collection's JSON API.

use axum::{
    extract::{Request, State},
    http::{StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};

use super::session::{CurrentSession, clear_session_cookie};
use crate::models::Collection;
use crate::services::check_access;
use crate::state::AppState;

/// Pages reachable without a session.
const PUBLIC_PATHS: &[&str] = &["/", "/auth/login", "/auth/register"];

/// Where signed-in users land.
pub const HOME_PATH: &str = "/dashboard";

/// Where anonymous users are sent.
pub const LOGIN_PATH: &str = "/auth/login";

/// Whether the guard looks at `path` at all.
#[must_use]
pub fn is_guarded(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path) || path == HOME_PATH || path.starts_with("/dashboard/")
}

/// Whether `path` is public.
#[must_use]
pub fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path)
}

/// Edge guard for the page routes.
///
/// - session cookie on a public page: redirect to the dashboard
/// - no cookie on a protected page: redirect to login
/// - cookie that does not resolve: redirect to login and clear it
/// - role not allowed on the page: 403
pub async fn route_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if !is_guarded(path) {
        return next.run(request).await;
    }

    let public = is_public(path);
    let session = request
        .extensions()
        .get::<CurrentSession>()
        .cloned()
        .unwrap_or_default();

    match (session.has_token(), public) {
        (true, true) => return Redirect::to(HOME_PATH).into_response(),
        (false, true) => return next.run(request).await,
        (false, false) => return Redirect::to(LOGIN_PATH).into_response(),
        (true, false) => {}
    }

    let Some(identity) = session.identity else {
        tracing::debug!(path, "Session cookie did not resolve, clearing it");
        return (
            AppendHeaders([(
                SET_COOKIE,
                clear_session_cookie(state.config().secure_cookies()),
            )]),
            Redirect::to(LOGIN_PATH),
        )
            .into_response();
    };

    if !check_access(path, identity.role) {
        tracing::info!(path, uid = %identity.uid, role = %identity.role, "Page access denied");
        return StatusCode::FORBIDDEN.into_response();
    }

    next.run(request).await
}

/// Guard for a collection's API routes, using the permissions of the
/// collection's dashboard page.
pub async fn require_collection_access(
    State(collection): State<Collection>,
    request: Request,
    next: Next,
) -> Response {
    let role = request
        .extensions()
        .get::<CurrentSession>()
        .and_then(|session| session.identity.as_ref())
        .map(|identity| identity.role);

    match role {
        None => StatusCode::UNAUTHORIZED.into_response(),
        Some(role) if !check_access(collection.page_route(), role) => {
            tracing::info!(collection = %collection, role = %role, "API access denied");
            StatusCode::FORBIDDEN.into_response()
        }
        Some(_) => next.run(request).await,
    }
}
