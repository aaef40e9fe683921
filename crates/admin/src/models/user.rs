//! The `users` record collection.
//!
//! These records are what the users screen manages. They are separate from
//! [`Identity`](super::Identity): editing a user record never changes who can
//! log in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dashboard_core::{Email, Field, FieldKind, FieldValue, RecordId, Role};

use super::entity::{Collection, Entity, ValidationError};

/// A user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: RecordId,
    pub email: Email,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "photoURL", default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Queryable fields of [`UserRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    Id,
    Email,
    DisplayName,
    PhotoUrl,
    Role,
    CreatedAt,
    UpdatedAt,
}

impl Field for UserField {
    const ALL: &'static [Self] = &[
        Self::Id,
        Self::Email,
        Self::DisplayName,
        Self::PhotoUrl,
        Self::Role,
        Self::CreatedAt,
        Self::UpdatedAt,
    ];

    const SEARCHABLE: &'static [Self] = &[Self::DisplayName, Self::Email, Self::Role];

    fn name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Email => "email",
            Self::DisplayName => "displayName",
            Self::PhotoUrl => "photoURL",
            Self::Role => "role",
            Self::CreatedAt => "createdAt",
            Self::UpdatedAt => "updatedAt",
        }
    }

    fn kind(self) -> FieldKind {
        match self {
            Self::CreatedAt | Self::UpdatedAt => FieldKind::Timestamp,
            _ => FieldKind::Text,
        }
    }
}

/// Payload for creating a user record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[serde(default)]
    pub id: Option<RecordId>,
    pub email: Email,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub role: Role,
}

/// Partial update of a user record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub email: Option<Email>,
    pub display_name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub role: Option<Role>,
}

/// CSV row for a user. Contact details beyond the email are left out.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserExport {
    pub id: RecordId,
    pub email: Email,
    pub display_name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

fn validate_email(email: &Email) -> Result<(), ValidationError> {
    Email::parse(email.as_str())
        .map(|_| ())
        .map_err(|e| ValidationError::new("email", e.to_string()))
}

impl Entity for UserRecord {
    type Field = UserField;
    type Draft = NewUser;
    type Patch = UserPatch;
    type Export = UserExport;

    const COLLECTION: Collection = Collection::Users;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn draft_id(draft: &NewUser) -> Option<&RecordId> {
        draft.id.as_ref().filter(|id| !id.is_empty())
    }

    fn from_draft(draft: NewUser, id: RecordId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            email: draft.email,
            display_name: draft.display_name,
            photo_url: draft.photo_url,
            role: draft.role,
            created_at: now,
            updated_at: Some(now),
        }
    }

    fn apply_patch(&mut self, patch: UserPatch) {
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(display_name) = patch.display_name {
            self.display_name = Some(display_name);
        }
        if let Some(photo_url) = patch.photo_url {
            self.photo_url = Some(photo_url);
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
    }

    fn validate_draft(draft: &NewUser) -> Result<(), ValidationError> {
        validate_email(&draft.email)
    }

    fn validate_patch(patch: &UserPatch) -> Result<(), ValidationError> {
        patch.email.as_ref().map_or(Ok(()), validate_email)
    }

    fn field(&self, field: UserField) -> FieldValue {
        match field {
            UserField::Id => self.id.as_str().into(),
            UserField::Email => self.email.as_str().into(),
            UserField::DisplayName => self.display_name.as_deref().into(),
            UserField::PhotoUrl => self.photo_url.as_deref().into(),
            UserField::Role => self.role.as_str().into(),
            UserField::CreatedAt => self.created_at.into(),
            UserField::UpdatedAt => self.updated_at.into(),
        }
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    fn set_updated_at(&mut self, at: DateTime<Utc>) {
        self.updated_at = Some(at);
    }

    fn to_export(&self) -> UserExport {
        UserExport {
            id: self.id.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            role: self.role,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> UserRecord {
        UserRecord {
            id: RecordId::new("user456"),
            email: Email::parse("user@example.com").unwrap(),
            display_name: Some("Regular User".to_string()),
            photo_url: None,
            role: Role::User,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_serializes_with_original_field_names() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["displayName"], "Regular User");
        assert_eq!(value["role"], "user");
        assert!(value.get("photoURL").is_none());
        assert!(value.get("updatedAt").is_none());
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn test_apply_patch_keeps_unspecified_fields() {
        let mut user = sample();
        user.apply_patch(UserPatch {
            role: Some(Role::Admin),
            ..UserPatch::default()
        });
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.display_name.as_deref(), Some("Regular User"));
        assert_eq!(user.email.as_str(), "user@example.com");
    }

    #[test]
    fn test_search_covers_name_email_and_role() {
        let user = sample();
        assert!(user.matches_search("REGULAR"));
        assert!(user.matches_search("example.com"));
        assert!(user.matches_search("user"));
        assert!(!user.matches_search("admin"));
    }

    #[test]
    fn test_draft_rejects_invalid_email() {
        let draft: NewUser = serde_json::from_value(serde_json::json!({
            "email": "not-an-email",
        }))
        .unwrap();
        assert_eq!(draft.role, Role::User);
        assert!(UserRecord::validate_draft(&draft).is_err());
    }

    #[test]
    fn test_empty_draft_id_is_ignored() {
        let draft: NewUser = serde_json::from_value(serde_json::json!({
            "id": "",
            "email": "a@b.c",
        }))
        .unwrap();
        assert!(UserRecord::draft_id(&draft).is_none());
    }
}
