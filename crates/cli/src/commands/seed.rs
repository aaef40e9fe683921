//! Seed storage with the demo users, products and identities.
//!
//! Opening the dashboard state writes seed data for every missing collection,
//! so seeding is opening. `--reset` removes the stored collections first.
//!
//! Run with the server stopped: a running server keeps its startup copy of
//! every collection and overwrites the files on its next write.

use dashboard_admin::AppState;
use dashboard_admin::config::DashboardConfig;
use dashboard_admin::db::identities::IDENTITIES_KEY;
use dashboard_admin::models::{Collection, ProductRecord, UserRecord};
use dashboard_admin::storage::open_storage;

use super::CommandError;

/// Seed the configured storage.
///
/// # Errors
///
/// Returns an error if configuration is invalid or storage cannot be
/// read or written.
pub fn run(reset: bool) -> Result<(), CommandError> {
    let config = DashboardConfig::from_env()?;
    if config.data_dir.is_none() {
        tracing::warn!("DASHBOARD_DATA_DIR not set, seeding in-memory storage has no lasting effect");
    }

    let storage = open_storage(config.data_dir.as_deref())?;
    if reset {
        for collection in Collection::ALL {
            storage.remove(collection.storage_key())?;
        }
        storage.remove(IDENTITIES_KEY)?;
        tracing::info!("Stored collections removed");
    }

    let state = AppState::with_storage(config, storage)?;
    let users = state.records().all::<UserRecord>()?.len();
    let products = state.records().all::<ProductRecord>()?.len();
    let identities = state.auth().identities().list()?.len();

    tracing::info!(users, products, identities, "Storage seeded");
    Ok(())
}
