//! Authenticated identities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dashboard_core::{Email, IdentityId, Role};

/// An identity that can hold a session.
///
/// This is the shape handed to handlers and returned by `/api/auth/me`; it
/// never carries credential material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub uid: IdentityId,
    #[serde(default)]
    pub email: Option<Email>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    /// Name to greet the identity by: display name, then email, then uid.
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or_else(|| self.email.as_ref().map(Email::as_str))
            .unwrap_or_else(|| self.uid.as_str())
    }
}

/// Persisted form of an identity, including its password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredIdentity {
    #[serde(flatten)]
    pub identity: Identity,
    /// PHC-format argon2 hash. Identities without one cannot log in by password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
}
