//! Identity list backing the session store.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tracing::instrument;

use dashboard_core::{Email, IdentityId};

use super::RepositoryError;
use super::seed;
use crate::models::{Identity, StoredIdentity};
use crate::storage::{Storage, StorageError, read_json, write_json};

/// Storage key of the identity list.
pub const IDENTITIES_KEY: &str = "mockUsers";

const COLLECTION: &str = "identity";

/// Repository for identities, persisted as one list under [`IDENTITIES_KEY`].
#[derive(Debug)]
pub struct IdentityRepository {
    storage: Arc<dyn Storage>,
    identities: RwLock<Vec<StoredIdentity>>,
}

impl IdentityRepository {
    /// Load the identity list, seeding it when absent.
    ///
    /// `seed_password_hash` is given to the seed identities when they are
    /// first written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if the backend cannot be read or the
    /// seed cannot be written.
    pub fn open(
        storage: Arc<dyn Storage>,
        seed_password_hash: Option<&str>,
    ) -> Result<Self, RepositoryError> {
        let identities = match read_json::<Vec<StoredIdentity>>(storage.as_ref(), IDENTITIES_KEY) {
            Ok(Some(identities)) => {
                tracing::debug!(count = identities.len(), "Loaded identities");
                identities
            }
            Ok(None) => {
                let identities = seed::identities(Utc::now(), seed_password_hash);
                write_json(storage.as_ref(), IDENTITIES_KEY, &identities)?;
                tracing::info!(
                    count = identities.len(),
                    with_password = seed_password_hash.is_some(),
                    "Seeded identities"
                );
                identities
            }
            Err(e @ StorageError::Corrupt { .. }) => {
                tracing::warn!(error = %e, "Stored identities are unreadable, using seed identities");
                seed::identities(Utc::now(), seed_password_hash)
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            storage,
            identities: RwLock::new(identities),
        })
    }

    /// All identities, without credential material.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Poisoned` if the lock is poisoned.
    pub fn list(&self) -> Result<Vec<Identity>, RepositoryError> {
        Ok(self
            .read()?
            .iter()
            .map(|stored| stored.identity.clone())
            .collect())
    }

    /// Look up an identity by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Poisoned` if the lock is poisoned.
    pub fn get_by_id(&self, id: &IdentityId) -> Result<Option<StoredIdentity>, RepositoryError> {
        Ok(self
            .read()?
            .iter()
            .find(|stored| &stored.identity.uid == id)
            .cloned())
    }

    /// Look up an identity by email, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Poisoned` if the lock is poisoned.
    pub fn get_by_email(&self, email: &Email) -> Result<Option<StoredIdentity>, RepositoryError> {
        Ok(self
            .read()?
            .iter()
            .find(|stored| email_matches(stored, email))
            .cloned())
    }

    /// Append a new identity and persist the list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the id or email is taken (the
    /// list is left unchanged), or a storage error.
    #[instrument(skip(self, identity), fields(uid = %identity.identity.uid))]
    pub fn insert(&self, identity: StoredIdentity) -> Result<Identity, RepositoryError> {
        let mut identities = self.write()?;

        if identities
            .iter()
            .any(|stored| stored.identity.uid == identity.identity.uid)
        {
            return Err(RepositoryError::Conflict(format!(
                "identity '{}' already exists",
                identity.identity.uid
            )));
        }
        if let Some(email) = &identity.identity.email
            && identities.iter().any(|stored| email_matches(stored, email))
        {
            return Err(RepositoryError::Conflict(format!(
                "an identity with email '{email}' already exists"
            )));
        }

        let public = identity.identity.clone();
        identities.push(identity);
        if let Err(e) = self.persist(&identities) {
            identities.pop();
            return Err(e);
        }

        tracing::info!("Identity created");
        Ok(public)
    }

    /// Replace an identity's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the identity does not exist, or a
    /// storage error.
    #[instrument(skip(self, password_hash))]
    pub fn set_password_hash(
        &self,
        id: &IdentityId,
        password_hash: String,
    ) -> Result<Identity, RepositoryError> {
        self.modify(id, |stored| stored.password_hash = Some(password_hash))
    }

    /// Replace an identity's display name and, when given, avatar reference.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the identity does not exist, or a
    /// storage error.
    #[instrument(skip(self))]
    pub fn update_profile(
        &self,
        id: &IdentityId,
        display_name: String,
        photo_url: Option<String>,
    ) -> Result<Identity, RepositoryError> {
        self.modify(id, |stored| {
            stored.identity.display_name = Some(display_name);
            if let Some(photo_url) = photo_url {
                stored.identity.photo_url = Some(photo_url);
            }
        })
    }

    fn modify(
        &self,
        id: &IdentityId,
        change: impl FnOnce(&mut StoredIdentity),
    ) -> Result<Identity, RepositoryError> {
        let mut identities = self.write()?;
        let index = identities
            .iter()
            .position(|stored| &stored.identity.uid == id)
            .ok_or_else(|| RepositoryError::NotFound {
                collection: COLLECTION,
                id: id.to_string(),
            })?;

        let previous = identities[index].clone();
        change(&mut identities[index]);
        if let Err(e) = self.persist(&identities) {
            identities[index] = previous;
            return Err(e);
        }

        Ok(identities[index].identity.clone())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<StoredIdentity>>, RepositoryError> {
        self.identities
            .read()
            .map_err(|_| RepositoryError::Poisoned(COLLECTION))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<StoredIdentity>>, RepositoryError> {
        self.identities
            .write()
            .map_err(|_| RepositoryError::Poisoned(COLLECTION))
    }

    fn persist(&self, identities: &[StoredIdentity]) -> Result<(), RepositoryError> {
        write_json(self.storage.as_ref(), IDENTITIES_KEY, identities)?;
        Ok(())
    }
}

fn email_matches(stored: &StoredIdentity, email: &Email) -> bool {
    stored
        .identity
        .email
        .as_ref()
        .is_some_and(|own| own.same_address(email))
}
