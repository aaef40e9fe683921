//! Authentication extractors.
//!
//! Both read the [`CurrentSession`] attached by
//! [`resolve_session`](super::session::resolve_session).

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};

use super::session::CurrentSession;
use crate::models::Identity;

/// Extractor that requires a signed-in identity.
///
/// Rejects API requests with 401 and page requests with a redirect to the
/// login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn profile(RequireIdentity(identity): RequireIdentity) -> impl IntoResponse {
///     format!("Hello, {}!", identity.label())
/// }
/// ```
pub struct RequireIdentity(pub Identity);

/// Error returned when an identity is required but none is signed in.
#[derive(Debug)]
pub enum IdentityRejection {
    /// Redirect to login page (for page requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for IdentityRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireIdentity
where
    S: Send + Sync,
{
    type Rejection = IdentityRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentSession>()
            .and_then(|session| session.identity.clone())
            .map(Self)
            .ok_or_else(|| {
                if parts.uri.path().starts_with("/api/") {
                    IdentityRejection::Unauthorized
                } else {
                    IdentityRejection::RedirectToLogin
                }
            })
    }
}

/// Extractor that optionally gets the signed-in identity.
pub struct OptionalIdentity(pub Option<Identity>);

impl<S> FromRequestParts<S> for OptionalIdentity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<CurrentSession>()
                .and_then(|session| session.identity.clone()),
        ))
    }
}
