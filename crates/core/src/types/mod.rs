//! Core types for the dashboard.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod query;
pub mod role;

pub use email::{Email, EmailError};
pub use id::*;
pub use query::{
    DEFAULT_PAGE_SIZE, Field, FieldKind, FieldValue, Filter, FilterOp, MAX_PAGE_SIZE,
    PageRequest, QueryError, Sort, SortOrder,
};
pub use role::{Role, RoleError};
