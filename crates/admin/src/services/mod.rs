//! Business logic services for the dashboard.
//!
//! # Services
//!
//! - `auth` - identities, password login and signed session tokens
//! - `authorization` - the route permission table and navigation
//! - `export` - CSV rendering of collections
//! - `stats` - dashboard and report figures

pub mod auth;
pub mod authorization;
pub mod export;
pub mod stats;

pub use auth::{AuthError, AuthService, Session, SessionTokenCodec};
pub use authorization::{NavItem, check_access, navigation};
pub use export::{ExportError, objects_to_csv, records_to_csv};
