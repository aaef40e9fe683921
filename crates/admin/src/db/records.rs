//! The record store: typed collections with CRUD and list queries.

use std::collections::HashSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::instrument;

use dashboard_core::{Filter, PageRequest, RecordId, Sort};

use super::RepositoryError;
use super::seed;
use crate::models::{Entity, ProductRecord, UserRecord};
use crate::storage::{Storage, StorageError, read_json, write_json};

/// Options for [`RecordStore::list`].
#[derive(Debug, Clone)]
pub struct ListOptions<F> {
    /// Free-text search over the collection's searchable fields.
    pub search: Option<String>,
    /// Filters, all of which must match.
    pub filters: Vec<Filter<F>>,
    /// Optional single-field sort. Without one, insertion order is kept.
    pub sort: Option<Sort<F>>,
    pub page: PageRequest,
}

impl<F> Default for ListOptions<F> {
    fn default() -> Self {
        Self {
            search: None,
            filters: Vec::new(),
            sort: None,
            page: PageRequest::default(),
        }
    }
}

/// One page of a list query.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage<E> {
    pub items: Vec<E>,
    /// Whether a further page exists.
    pub has_more: bool,
    /// Size of the filtered set before pagination.
    pub total_count: usize,
    pub page: u32,
    pub page_size: u32,
}

/// Result of [`RecordStore::delete_many`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkDeleteOutcome {
    pub deleted: Vec<RecordId>,
    pub missing: Vec<RecordId>,
}

/// An entity type with a table in the [`RecordStore`].
pub trait Table: Entity {
    fn table(store: &RecordStore) -> &RwLock<Vec<Self>>;
}

impl Table for UserRecord {
    fn table(store: &RecordStore) -> &RwLock<Vec<Self>> {
        &store.users
    }
}

impl Table for ProductRecord {
    fn table(store: &RecordStore) -> &RwLock<Vec<Self>> {
        &store.products
    }
}

/// In-memory record collections, written through to [`Storage`].
#[derive(Debug)]
pub struct RecordStore {
    storage: Arc<dyn Storage>,
    users: RwLock<Vec<UserRecord>>,
    products: RwLock<Vec<ProductRecord>>,
}

impl RecordStore {
    /// Load every collection from storage, seeding missing ones.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if the backend cannot be read, or a
    /// missing collection's seed cannot be written.
    pub fn open(storage: Arc<dyn Storage>) -> Result<Self, RepositoryError> {
        let now = Utc::now();
        let users = load_collection(storage.as_ref(), || seed::users(now))?;
        let products = load_collection(storage.as_ref(), || {
            seed::products(&mut rand::rng(), now)
        })?;

        Ok(Self {
            storage,
            users: RwLock::new(users),
            products: RwLock::new(products),
        })
    }

    /// Storage backend this store writes to.
    #[must_use]
    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    /// Create a record from a draft.
    ///
    /// The id comes from the draft when it carries one, otherwise a fresh one
    /// is generated. `createdAt` and `updatedAt` are both set to now.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Validation` for an invalid draft,
    /// `RepositoryError::Conflict` if the id is taken, or a storage error.
    #[instrument(skip(self, draft), fields(collection = %E::COLLECTION))]
    pub fn create<E: Table>(&self, draft: E::Draft) -> Result<E, RepositoryError> {
        E::validate_draft(&draft)?;

        let mut items = self.write::<E>()?;
        let id = match E::draft_id(&draft) {
            Some(id) => id.clone(),
            None => RecordId::generate(None),
        };
        if items.iter().any(|item| item.id() == &id) {
            return Err(RepositoryError::Conflict(format!(
                "{} '{id}' already exists",
                E::COLLECTION
            )));
        }

        let record = E::from_draft(draft, id, Utc::now());
        items.push(record.clone());
        if let Err(e) = self.persist(&items) {
            items.pop();
            return Err(e);
        }

        tracing::info!(id = %record.id(), "Record created");
        Ok(record)
    }

    /// Fetch a record by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Poisoned` if the collection lock is poisoned.
    pub fn get_by_id<E: Table>(&self, id: &RecordId) -> Result<Option<E>, RepositoryError> {
        let items = self.read::<E>()?;
        Ok(items.iter().find(|item| item.id() == id).cloned())
    }

    /// Fetch the records with the given ids, in collection order.
    ///
    /// Unknown ids are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Poisoned` if the collection lock is poisoned.
    pub fn get_many<E: Table>(&self, ids: &[RecordId]) -> Result<Vec<E>, RepositoryError> {
        let wanted: HashSet<&RecordId> = ids.iter().collect();
        let items = self.read::<E>()?;
        Ok(items
            .iter()
            .filter(|item| wanted.contains(item.id()))
            .cloned()
            .collect())
    }

    /// Every record of the collection, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Poisoned` if the collection lock is poisoned.
    pub fn all<E: Table>(&self) -> Result<Vec<E>, RepositoryError> {
        Ok(self.read::<E>()?.clone())
    }

    /// Merge a patch into an existing record and restamp `updatedAt`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no record has this id,
    /// `RepositoryError::Validation` for an invalid patch, or a storage error.
    #[instrument(skip(self, patch), fields(collection = %E::COLLECTION, id = %id))]
    pub fn update<E: Table>(&self, id: &RecordId, patch: E::Patch) -> Result<E, RepositoryError> {
        E::validate_patch(&patch)?;

        let mut items = self.write::<E>()?;
        let index = items
            .iter()
            .position(|item| item.id() == id)
            .ok_or_else(|| not_found::<E>(id))?;

        let mut updated = items[index].clone();
        updated.apply_patch(patch);
        updated.set_updated_at(next_update_stamp(&updated, Utc::now()));

        let previous = std::mem::replace(&mut items[index], updated.clone());
        if let Err(e) = self.persist(&items) {
            items[index] = previous;
            return Err(e);
        }

        tracing::info!("Record updated");
        Ok(updated)
    }

    /// Remove one record.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no record has this id (the
    /// collection is left unchanged), or a storage error.
    #[instrument(skip(self), fields(collection = %E::COLLECTION, id = %id))]
    pub fn delete<E: Table>(&self, id: &RecordId) -> Result<(), RepositoryError> {
        let mut items = self.write::<E>()?;
        let index = items
            .iter()
            .position(|item| item.id() == id)
            .ok_or_else(|| not_found::<E>(id))?;

        let removed = items.remove(index);
        if let Err(e) = self.persist(&items) {
            items.insert(index, removed);
            return Err(e);
        }

        tracing::info!("Record deleted");
        Ok(())
    }

    /// Remove every record whose id is in `ids`, persisting once.
    ///
    /// Ids that match nothing are reported in `missing`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the collection cannot be written; nothing
    /// is removed in that case.
    #[instrument(skip(self, ids), fields(collection = %E::COLLECTION, requested = ids.len()))]
    pub fn delete_many<E: Table>(
        &self,
        ids: &[RecordId],
    ) -> Result<BulkDeleteOutcome, RepositoryError> {
        let wanted: HashSet<&RecordId> = ids.iter().collect();
        let mut items = self.write::<E>()?;

        let mut outcome = BulkDeleteOutcome::default();
        for id in ids {
            if outcome.deleted.contains(id) || outcome.missing.contains(id) {
                continue;
            }
            if items.iter().any(|item| item.id() == id) {
                outcome.deleted.push(id.clone());
            } else {
                outcome.missing.push(id.clone());
            }
        }
        if outcome.deleted.is_empty() {
            return Ok(outcome);
        }

        let snapshot = items.clone();
        items.retain(|item| !wanted.contains(item.id()));
        if let Err(e) = self.persist(&items) {
            *items = snapshot;
            return Err(e);
        }

        tracing::info!(deleted = outcome.deleted.len(), "Records deleted");
        Ok(outcome)
    }

    /// Search, filter and sort the collection without paginating.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Poisoned` if the collection lock is poisoned.
    pub fn query<E: Table>(
        &self,
        options: &ListOptions<E::Field>,
    ) -> Result<Vec<E>, RepositoryError> {
        let search = options
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let mut matching: Vec<E> = self
            .read::<E>()?
            .iter()
            .filter(|item| search.is_none_or(|needle| item.matches_search(needle)))
            .filter(|item| {
                options
                    .filters
                    .iter()
                    .all(|filter| filter.matches(&item.field(filter.field)))
            })
            .cloned()
            .collect();

        if let Some(sort) = options.sort {
            matching.sort_by(|a, b| sort.compare(&a.field(sort.field), &b.field(sort.field)));
        }

        Ok(matching)
    }

    /// One page of the searched, filtered and sorted collection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Poisoned` if the collection lock is poisoned.
    pub fn list<E: Table>(
        &self,
        options: &ListOptions<E::Field>,
    ) -> Result<ListPage<E>, RepositoryError> {
        let matching = self.query::<E>(options)?;
        let total_count = matching.len();
        let page = options.page;

        let items: Vec<E> = matching
            .into_iter()
            .skip(page.start())
            .take(page.page_size() as usize)
            .collect();

        Ok(ListPage {
            items,
            has_more: page.end() < total_count,
            total_count,
            page: page.page(),
            page_size: page.page_size(),
        })
    }

    fn read<E: Table>(&self) -> Result<RwLockReadGuard<'_, Vec<E>>, RepositoryError> {
        E::table(self)
            .read()
            .map_err(|_| RepositoryError::Poisoned(E::COLLECTION.name()))
    }

    fn write<E: Table>(&self) -> Result<RwLockWriteGuard<'_, Vec<E>>, RepositoryError> {
        E::table(self)
            .write()
            .map_err(|_| RepositoryError::Poisoned(E::COLLECTION.name()))
    }

    fn persist<E: Entity>(&self, items: &[E]) -> Result<(), RepositoryError> {
        write_json(self.storage.as_ref(), E::COLLECTION.storage_key(), items)?;
        Ok(())
    }
}

fn not_found<E: Entity>(id: &RecordId) -> RepositoryError {
    RepositoryError::NotFound {
        collection: E::COLLECTION.name(),
        id: id.to_string(),
    }
}

/// A timestamp strictly after both of the record's existing timestamps.
fn next_update_stamp<E: Entity>(record: &E, now: DateTime<Utc>) -> DateTime<Utc> {
    let floor = record
        .updated_at()
        .map_or(record.created_at(), |at| at.max(record.created_at()));
    if now > floor {
        now
    } else {
        floor + Duration::microseconds(1)
    }
}

/// Read a collection, seeding it when the key is missing.
///
/// A value that does not parse is logged and left as-is in storage; the seed
/// is used in memory for this run.
fn load_collection<E: Entity>(
    storage: &dyn Storage,
    seed: impl FnOnce() -> Vec<E>,
) -> Result<Vec<E>, RepositoryError> {
    let key = E::COLLECTION.storage_key();
    match read_json::<Vec<E>>(storage, key) {
        Ok(Some(items)) => {
            tracing::debug!(key, count = items.len(), "Loaded collection");
            Ok(items)
        }
        Ok(None) => {
            let items = seed();
            write_json(storage, key, &items)?;
            tracing::info!(key, count = items.len(), "Seeded collection");
            Ok(items)
        }
        Err(e @ StorageError::Corrupt { .. }) => {
            tracing::warn!(key, error = %e, "Stored collection is unreadable, using seed data");
            Ok(seed())
        }
        Err(e) => Err(e.into()),
    }
}
