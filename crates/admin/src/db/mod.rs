//! Persistence for dashboard state on top of the key-value [`Storage`].
//!
//! # Keys
//!
//! - `mock_users` - the `users` record collection
//! - `mock_products` - the `products` record collection
//! - `mockUsers` - the identity list used for sessions
//!
//! Each collection is held in memory behind a lock and written back in full
//! after every mutation. Missing keys are seeded on first start; keys holding
//! unparsable JSON are left untouched on disk and the seed is used in memory.
//!
//! [`Storage`]: crate::storage::Storage

pub mod identities;
pub mod records;
pub mod seed;

use thiserror::Error;

use crate::models::ValidationError;
use crate::storage::StorageError;

pub use identities::IdentityRepository;
pub use records::{ListOptions, ListPage, RecordStore};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Storage backend failure.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Requested entity was not found.
    #[error("{collection} '{id}' not found")]
    NotFound { collection: &'static str, id: String },

    /// Uniqueness violation (duplicate id or email).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Caller-supplied data failed validation.
    #[error("invalid data: {0}")]
    Validation(#[from] ValidationError),

    /// An in-memory collection lock was poisoned by a panicking writer.
    #[error("{0} lock poisoned")]
    Poisoned(&'static str),
}
