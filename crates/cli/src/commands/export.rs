//! CSV export of a collection.

use std::io::Write;
use std::path::Path;

use dashboard_admin::db::ListOptions;
use dashboard_admin::db::records::Table;
use dashboard_admin::models::{Collection, ProductRecord, UserRecord};
use dashboard_admin::services::records_to_csv;
use dashboard_admin::state::AppState;

use super::{CommandError, open_state};

/// Export `collection` (optionally searched) to `out`, or stdout.
///
/// # Errors
///
/// Returns an error if the collection cannot be read or the output cannot
/// be written.
pub fn run(
    collection: Collection,
    search: Option<String>,
    out: Option<&Path>,
) -> Result<(), CommandError> {
    let state = open_state()?;
    export(&state, collection, search, out)
}

fn export(
    state: &AppState,
    collection: Collection,
    search: Option<String>,
    out: Option<&Path>,
) -> Result<(), CommandError> {
    let (rows, csv) = match collection {
        Collection::Users => render::<UserRecord>(state, search)?,
        Collection::Products => render::<ProductRecord>(state, search)?,
    };

    match out {
        Some(path) => {
            std::fs::write(path, csv)?;
            tracing::info!(collection = %collection, rows, path = %path.display(), "Export written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(csv.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}

fn render<E: Table>(
    state: &AppState,
    search: Option<String>,
) -> Result<(usize, String), CommandError> {
    let options = ListOptions {
        search,
        ..ListOptions::default()
    };
    let records = state.records().query::<E>(&options)?;
    Ok((records.len(), records_to_csv(&records)?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use secrecy::SecretString;

    use dashboard_admin::DashboardConfig;
    use dashboard_admin::storage::MemoryStorage;

    use super::*;

    fn state() -> AppState {
        let config = DashboardConfig::with_secret(SecretString::from(
            "cli-export-test-secret-with-plenty-of-entropy-0123456789".to_owned(),
        ));
        AppState::with_storage(config, Arc::new(MemoryStorage::new())).unwrap()
    }

    #[test]
    fn test_export_products_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.csv");

        export(&state(), Collection::Products, None, Some(&path)).unwrap();

        let csv = std::fs::read_to_string(&path).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("id,name,description,price,category,inStock,createdAt")
        );
        assert_eq!(lines.count(), 10);
    }

    #[test]
    fn test_export_users_with_search() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.csv");

        export(
            &state(),
            Collection::Users,
            Some("admin@".to_owned()),
            Some(&path),
        )
        .unwrap();

        let csv = std::fs::read_to_string(&path).unwrap();
        assert_eq!(csv.lines().count(), 2);
        assert!(csv.contains("admin@example.com"));
        assert!(!csv.contains("user@example.com"));
    }
}
