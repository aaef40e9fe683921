//! Application state shared across handlers.

use std::sync::Arc;

use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::DashboardConfig;
use crate::db::{IdentityRepository, RecordStore, RepositoryError};
use crate::services::auth::{self, AuthError, AuthService, SessionTokenCodec};
use crate::storage::{Storage, StorageError, open_storage};

/// Errors that can occur while building the application state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open storage: {0}")]
    Storage(#[from] StorageError),

    #[error("failed to load persisted data: {0}")]
    Repository(#[from] RepositoryError),

    #[error("failed to prepare seed identities: {0}")]
    Auth(#[from] AuthError),
}

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

#[derive(Debug)]
struct AppStateInner {
    config: DashboardConfig,
    storage: Arc<dyn Storage>,
    records: RecordStore,
    auth: AuthService,
}

impl AppState {
    /// Build the state on the storage backend named by the configuration.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if the storage cannot be opened or read.
    pub fn new(config: DashboardConfig) -> Result<Self, StateError> {
        let storage = open_storage(config.data_dir.as_deref())?;
        Self::with_storage(config, storage)
    }

    /// Build the state on an explicit storage backend.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if the stored collections cannot be read or the
    /// seed data cannot be written.
    pub fn with_storage(
        config: DashboardConfig,
        storage: Arc<dyn Storage>,
    ) -> Result<Self, StateError> {
        let seed_hash = config
            .seed_password
            .as_ref()
            .map(|password| auth::hash_password(password.expose_secret()))
            .transpose()?;

        let identities = IdentityRepository::open(Arc::clone(&storage), seed_hash.as_deref())?;
        let records = RecordStore::open(Arc::clone(&storage))?;
        let auth = AuthService::new(
            identities,
            SessionTokenCodec::new(config.session_secret.clone()),
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                storage,
                records,
                auth,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn storage(&self) -> &dyn Storage {
        self.inner.storage.as_ref()
    }

    #[must_use]
    pub fn records(&self) -> &RecordStore {
        &self.inner.records
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }
}
