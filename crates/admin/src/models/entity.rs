//! The [`Entity`] trait implemented by every record collection.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use dashboard_core::{Field, FieldValue, RecordId};

/// A caller-supplied draft or patch failed validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// The named record collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Users,
    Products,
}

impl Collection {
    pub const ALL: [Self; 2] = [Self::Users, Self::Products];

    /// Collection name as used in URLs and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Products => "products",
        }
    }

    /// Key under which the collection is persisted.
    #[must_use]
    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::Users => "mock_users",
            Self::Products => "mock_products",
        }
    }

    /// Dashboard page whose permissions also govern the collection's API.
    #[must_use]
    pub const fn page_route(self) -> &'static str {
        match self {
            Self::Users => "/dashboard/users",
            Self::Products => "/dashboard/products",
        }
    }

    /// File name offered for CSV downloads.
    #[must_use]
    pub const fn export_filename(self) -> &'static str {
        match self {
            Self::Users => "users-export.csv",
            Self::Products => "products-export.csv",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown collection name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown collection '{0}' (expected 'users' or 'products')")]
pub struct UnknownCollection(pub String);

impl FromStr for Collection {
    type Err = UnknownCollection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "users" => Ok(Self::Users),
            "products" => Ok(Self::Products),
            other => Err(UnknownCollection(other.to_owned())),
        }
    }
}

/// A record type stored in one collection.
///
/// Timestamps are owned by the store: drafts and patches carry no
/// `createdAt`/`updatedAt`, and the store stamps them on every write.
pub trait Entity:
    Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Queryable fields of the collection.
    type Field: Field;
    /// Payload for creating a record.
    type Draft: DeserializeOwned + fmt::Debug + Send;
    /// Partial update; `None` fields keep their current value.
    type Patch: DeserializeOwned + fmt::Debug + Send;
    /// Row shape used for CSV export.
    type Export: Serialize;

    const COLLECTION: Collection;

    fn id(&self) -> &RecordId;

    /// Caller-chosen id, if the draft carries one.
    fn draft_id(draft: &Self::Draft) -> Option<&RecordId>;

    /// Build a record from a validated draft.
    fn from_draft(draft: Self::Draft, id: RecordId, now: DateTime<Utc>) -> Self;

    /// Merge a validated patch into the record.
    fn apply_patch(&mut self, patch: Self::Patch);

    /// Check a draft before it reaches the store.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming the offending field.
    fn validate_draft(_draft: &Self::Draft) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Check a patch before it reaches the store.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming the offending field.
    fn validate_patch(_patch: &Self::Patch) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Value of one field, for filtering and sorting.
    fn field(&self, field: Self::Field) -> FieldValue;

    fn created_at(&self) -> DateTime<Utc>;

    fn updated_at(&self) -> Option<DateTime<Utc>>;

    fn set_updated_at(&mut self, at: DateTime<Utc>);

    /// Project the record into its export row.
    fn to_export(&self) -> Self::Export;

    /// Whether any searchable field contains `needle` (case-insensitive).
    fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        <Self::Field as Field>::SEARCHABLE
            .iter()
            .any(|&field| self.field(field).render().to_lowercase().contains(&needle))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_names_and_keys() {
        assert_eq!(Collection::Users.storage_key(), "mock_users");
        assert_eq!(Collection::Products.storage_key(), "mock_products");
        assert_eq!("products".parse::<Collection>().unwrap(), Collection::Products);
        assert!("orders".parse::<Collection>().is_err());
    }

    #[test]
    fn test_collection_page_routes() {
        assert_eq!(Collection::Users.page_route(), "/dashboard/users");
        assert_eq!(Collection::Products.page_route(), "/dashboard/products");
    }
}
