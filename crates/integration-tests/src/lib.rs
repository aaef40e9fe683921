//! Integration test harness for the admin dashboard.
//!
//! Each test starts its own server on an ephemeral port, backed by in-memory
//! storage (or a temporary data directory), and drives it over HTTP with
//! `reqwest`. Redirects are not followed so tests can assert on them, and
//! the session cookie is carried explicitly.
//!
//! ```rust,ignore
//! #[tokio::test]
//! async fn test_health() {
//!     let server = TestServer::start().await;
//!     let resp = server.get("/health", None).await;
//!     assert_eq!(resp.status(), 200);
//! }
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use reqwest::{
    Client, RequestBuilder, Response, StatusCode,
    header::{COOKIE, LOCATION, SET_COOKIE},
    redirect,
};
use secrecy::SecretString;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use dashboard_admin::storage::{MemoryStorage, Storage};
use dashboard_admin::{AppState, DashboardConfig, app};

/// Signing key used by every test server.
pub const TEST_SECRET: &str = "integration-test-signing-key-7f3a9c21e4b8d605";

/// Password the seed identities receive.
pub const SEED_PASSWORD: &str = "seed-pass-2468";

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const USER_EMAIL: &str = "user@example.com";

/// Test configuration: defaults plus the seed password.
#[must_use]
pub fn test_config() -> DashboardConfig {
    let mut config = DashboardConfig::with_secret(SecretString::from(TEST_SECRET.to_owned()));
    config.seed_password = Some(SecretString::from(SEED_PASSWORD.to_owned()));
    config
}

/// A dashboard server running on an ephemeral port.
pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
    client: Client,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server on fresh in-memory storage.
    pub async fn start() -> Self {
        Self::start_with_storage(Arc::new(MemoryStorage::new())).await
    }

    /// Start a server on the given storage.
    pub async fn start_with_storage(storage: Arc<dyn Storage>) -> Self {
        let state = AppState::with_storage(test_config(), storage).unwrap();
        Self::start_with_state(state).await
    }

    /// Start a server for an already-built state.
    pub async fn start_with_state(state: AppState) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = app(state.clone());

        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            base_url: format!("http://{addr}"),
            state,
            client,
            handle,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Build a request, attaching the session cookie when given.
    #[must_use]
    pub fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        session: Option<&str>,
    ) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match session {
            Some(token) => builder.header(COOKIE, format!("session={token}")),
            None => builder,
        }
    }

    pub async fn get(&self, path: &str, session: Option<&str>) -> Response {
        self.request(reqwest::Method::GET, path, session)
            .send()
            .await
            .unwrap()
    }

    /// Log in through the form endpoint and return the session token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let resp = self
            .request(reqwest::Method::POST, "/auth/login", None)
            .form(&[("email", email), ("password", password)])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "login for {email} failed");
        session_token(&resp).unwrap()
    }

    /// Session token for the seed admin.
    pub async fn login_admin(&self) -> String {
        self.login(ADMIN_EMAIL, SEED_PASSWORD).await
    }

    /// Session token for the seed regular user.
    pub async fn login_user(&self) -> String {
        self.login(USER_EMAIL, SEED_PASSWORD).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// The raw `Set-Cookie` header for the session cookie, if the response set one.
#[must_use]
pub fn session_set_cookie(resp: &Response) -> Option<String> {
    resp.headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("session="))
        .map(String::from)
}

/// The session token a response set, if any (empty when it cleared it).
#[must_use]
pub fn session_token(resp: &Response) -> Option<String> {
    let cookie = session_set_cookie(resp)?;
    let value = cookie.strip_prefix("session=")?;
    Some(value.split(';').next().unwrap_or_default().to_owned())
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(resp: &Response) -> Option<String> {
    resp.headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(String::from)
}
