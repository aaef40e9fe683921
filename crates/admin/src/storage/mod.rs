//! Key-value storage substrate for persisted dashboard state.
//!
//! Every persisted value is a JSON document stored under a short key
//! (`mock_users`, `mock_products`, `mockUsers`). Writes replace the whole value
//! for a key; there are no partial updates.
//!
//! # Backends
//!
//! - [`FileStorage`] - one `<key>.json` file per key inside a data directory
//! - [`MemoryStorage`] - a process-local map, used for tests and ephemeral runs
//!
//! The data directory is configured with `DASHBOARD_DATA_DIR`. When unset the
//! service runs on [`MemoryStorage`] and everything is lost on restart.

mod file;
mod memory;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Key contains characters outside `[A-Za-z0-9_-]`.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// Stored value is not valid JSON for the expected type.
    #[error("corrupt value under key {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Value could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal lock was poisoned by a panicking writer.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// A synchronous key-value store holding JSON strings.
pub trait Storage: Send + Sync + fmt::Debug {
    /// Read the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the value stored under `key`. Missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Check that the backend is usable (readiness probe).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unavailable.
    fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Open the configured storage backend.
///
/// # Errors
///
/// Returns `StorageError::Io` if the data directory cannot be created.
pub fn open_storage(data_dir: Option<&Path>) -> Result<Arc<dyn Storage>, StorageError> {
    match data_dir {
        Some(dir) => {
            let storage = FileStorage::open(dir)?;
            tracing::info!(path = %dir.display(), "Using file storage");
            Ok(Arc::new(storage))
        }
        None => {
            tracing::warn!("DASHBOARD_DATA_DIR not set, state will not survive a restart");
            Ok(Arc::new(MemoryStorage::new()))
        }
    }
}

/// Read and deserialize the JSON value under `key`.
///
/// # Errors
///
/// Returns `StorageError::Corrupt` if the stored value does not parse as `T`,
/// or any backend read error.
pub fn read_json<T: DeserializeOwned>(
    storage: &dyn Storage,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(raw) = storage.get(key)? else {
        return Ok(None);
    };

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StorageError::Corrupt {
            key: key.to_owned(),
            source,
        })
}

/// Serialize `value` and store it under `key`.
///
/// # Errors
///
/// Returns an error if serialization or the backend write fails.
pub fn write_json<T: Serialize + ?Sized>(
    storage: &dyn Storage,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value)?;
    storage.set(key, &raw)
}

/// Validate a storage key.
fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("mock_users").is_ok());
        assert!(validate_key("mockUsers").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("a b").is_err());
    }

    #[test]
    fn test_json_helpers() {
        let storage = MemoryStorage::new();
        write_json(&storage, "numbers", &vec![1, 2, 3]).unwrap();
        let numbers: Option<Vec<i32>> = read_json(&storage, "numbers").unwrap();
        assert_eq!(numbers, Some(vec![1, 2, 3]));

        let missing: Option<Vec<i32>> = read_json(&storage, "missing").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_read_json_corrupt() {
        let storage = MemoryStorage::new();
        storage.set("broken", "{not json").unwrap();
        let result: Result<Option<Vec<i32>>, _> = read_json(&storage, "broken");
        assert!(matches!(result, Err(StorageError::Corrupt { .. })));
    }

    #[test]
    fn test_open_storage_picks_backend() {
        let memory = open_storage(None).unwrap();
        memory.set("mock_users", "[]").unwrap();
        assert_eq!(memory.get("mock_users").unwrap().as_deref(), Some("[]"));

        let dir = tempfile::tempdir().unwrap();
        let files = open_storage(Some(dir.path())).unwrap();
        files.set("mock_users", "[]").unwrap();
        assert!(dir.path().join("mock_users.json").exists());
    }
}
