//! Dashboard Core - Shared types library.
//!
//! This crate provides common types used across all dashboard components:
//! - `admin` - The dashboard HTTP service (sessions, records, authorization)
//! - `cli` - Command-line tools for seeding, identity management and exports
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no storage access,
//! no HTTP. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, roles and the typed list-query vocabulary

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
