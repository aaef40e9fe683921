//! Session cookie handling.
//!
//! The `session` cookie carries a signed token (see
//! [`SessionTokenCodec`](crate::services::SessionTokenCodec)). It is resolved
//! once per request by [`resolve_session`] and the result stored in request
//! extensions as a [`CurrentSession`], which guards and extractors read.

use axum::{
    extract::{Request, State},
    http::{
        HeaderMap, HeaderValue,
        header::{COOKIE, InvalidHeaderValue},
    },
    middleware::Next,
    response::Response,
};
use tracing::Span;

use crate::error::set_sentry_user;
use crate::models::{Identity, session::SESSION_TTL_SECS};
use crate::state::AppState;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "session";

/// The session state of one request.
#[derive(Debug, Clone, Default)]
pub struct CurrentSession {
    /// Raw cookie value, if a non-empty one was sent.
    pub token: Option<String>,
    /// Identity the token resolved to.
    pub identity: Option<Identity>,
}

impl CurrentSession {
    /// Whether the request carried a session cookie, valid or not.
    #[must_use]
    pub const fn has_token(&self) -> bool {
        self.token.is_some()
    }
}

/// Read the session token from the request's `Cookie` headers.
///
/// Empty values count as absent.
#[must_use]
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
        .map(String::from)
}

/// `Set-Cookie` value that stores a session token for a day.
///
/// # Errors
///
/// Returns an error if the token contains characters not allowed in a header.
pub fn session_cookie(token: &str, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let secure = if secure { "; Secure" } else { "" };
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; Path=/; Max-Age={SESSION_TTL_SECS}; HttpOnly; SameSite=Strict{secure}"
    ))
}

/// `Set-Cookie` value that removes the session cookie.
#[must_use]
pub const fn clear_session_cookie(secure: bool) -> HeaderValue {
    if secure {
        HeaderValue::from_static("session=; Path=/; Max-Age=0; HttpOnly; SameSite=Strict; Secure")
    } else {
        HeaderValue::from_static("session=; Path=/; Max-Age=0; HttpOnly; SameSite=Strict")
    }
}

/// Resolve the session cookie and attach a [`CurrentSession`] to the request.
pub async fn resolve_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = session_token(request.headers());
    let identity = state.auth().current_identity(token.as_deref());

    if let Some(identity) = &identity {
        Span::current().record("uid", identity.uid.as_str());
        set_sentry_user(
            identity.uid.as_str(),
            identity.email.as_ref().map(|e| e.as_str()),
        );
    }

    request
        .extensions_mut()
        .insert(CurrentSession { token, identity });
    next.run(request).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_session_token_found_among_other_cookies() {
        let headers = headers("theme=dark; session=abc.def; lang=en");
        assert_eq!(session_token(&headers).as_deref(), Some("abc.def"));
    }

    #[test]
    fn test_session_token_missing_or_empty() {
        assert_eq!(session_token(&HeaderMap::new()), None);
        assert_eq!(session_token(&headers("session=")), None);
        assert_eq!(session_token(&headers("sessionid=abc")), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("tok", false).unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("session=tok; "));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=86400"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(!cookie.contains("Secure"));

        let secure = session_cookie("tok", true).unwrap();
        assert!(secure.to_str().unwrap().ends_with("; Secure"));
    }

    #[test]
    fn test_clear_session_cookie_expires_immediately() {
        let cookie = clear_session_cookie(false);
        assert!(cookie.to_str().unwrap().contains("Max-Age=0"));
    }
}
