//! Admin dashboard library.
//!
//! Persistence, sessions and authorization for a small admin dashboard:
//! typed record collections written through to key-value storage, signed
//! session tokens, a static route permission table and the axum router that
//! ties them together.
//!
//! The binary in `main.rs` adds process setup (tracing, Sentry, TLS); tests
//! and the CLI use this library directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;

pub use config::DashboardConfig;
pub use routes::app;
pub use state::AppState;
