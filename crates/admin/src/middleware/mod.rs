//! HTTP middleware stack for the dashboard.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (added by the binary)
//! 2. `TraceLayer` (request span with method, uri, status, latency)
//! 3. Request ID (`x-request-id`, recorded on the span)
//! 4. Security headers
//! 5. Session resolution (cookie to [`CurrentSession`], once per request)
//! 6. Route guard (page redirects and the role gate)
//!
//! Collection API routes additionally carry [`require_collection_access`].

pub mod auth;
pub mod request_id;
pub mod route_guard;
pub mod security_headers;
pub mod session;

pub use auth::{IdentityRejection, OptionalIdentity, RequireIdentity};
pub use request_id::request_id_middleware;
pub use route_guard::{require_collection_access, route_guard};
pub use security_headers::security_headers_middleware;
pub use session::{
    CurrentSession, SESSION_COOKIE, clear_session_cookie, resolve_session, session_cookie,
};
