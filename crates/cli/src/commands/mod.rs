//! CLI command implementations.

pub mod export;
pub mod identity;
pub mod seed;

use thiserror::Error;

use dashboard_admin::AppState;
use dashboard_admin::config::{ConfigError, DashboardConfig};
use dashboard_admin::db::RepositoryError;
use dashboard_admin::services::{AuthError, ExportError};
use dashboard_admin::state::StateError;
use dashboard_admin::storage::StorageError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    State(#[from] StateError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("export error: {0}")]
    Export(#[from] ExportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no identity with email {0}")]
    UnknownIdentity(String),
}

/// Load configuration from the environment and open the dashboard state.
fn open_state() -> Result<AppState, CommandError> {
    let config = DashboardConfig::from_env()?;
    Ok(AppState::new(config)?)
}
