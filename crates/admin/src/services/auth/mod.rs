//! Session store: password authentication and session tokens.
//!
//! Identities live in the [`IdentityRepository`]; sessions are stateless signed
//! tokens (see [`token`]) naming an identity id. Passwords are hashed with
//! Argon2id and identities without a hash cannot log in by password.

mod error;
pub mod token;

pub use error::AuthError;
pub use token::{SessionTokenCodec, TokenError};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use chrono::Utc;
use rand::RngCore;
use tracing::instrument;

use dashboard_core::{Email, IdentityId, Role};

use crate::db::{IdentityRepository, RepositoryError};
use crate::models::{Identity, SessionClaims, StoredIdentity};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// An identity together with a freshly issued session token.
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: Identity,
    pub token: String,
}

/// Authentication service over the identity list.
#[derive(Debug)]
pub struct AuthService {
    identities: IdentityRepository,
    tokens: SessionTokenCodec,
}

impl AuthService {
    #[must_use]
    pub const fn new(identities: IdentityRepository, tokens: SessionTokenCodec) -> Self {
        Self { identities, tokens }
    }

    /// Backing identity repository.
    #[must_use]
    pub const fn identities(&self) -> &IdentityRepository {
        &self.identities
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Register a new identity with role `user` and start a session for it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password is too short.
    /// Returns `AuthError::UserAlreadyExists` if the email is taken; the
    /// identity list is left unchanged.
    pub fn create_identity(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Session, AuthError> {
        let identity = self.register_identity(email, password, name, Role::User)?;
        self.start_session(identity)
    }

    /// Register a new identity with the given role, without starting a
    /// session.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create_identity`].
    #[instrument(skip(self, password))]
    pub fn register_identity(
        &self,
        email: &str,
        password: &str,
        name: &str,
        role: Role,
    ) -> Result<Identity, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        if self.identities.get_by_email(&email)?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let password_hash = hash_password(password)?;
        let name = name.trim();
        let stored = StoredIdentity {
            identity: Identity {
                uid: IdentityId::generate(Some("user")),
                email: Some(email),
                display_name: (!name.is_empty()).then(|| name.to_owned()),
                photo_url: None,
                role,
                created_at: Utc::now(),
            },
            password_hash: Some(password_hash),
        };

        let identity = self.identities.insert(stored).map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Repository(other),
        })?;

        tracing::info!(uid = %identity.uid, role = %identity.role, "Identity registered");
        Ok(identity)
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email is unknown, the
    /// identity has no password, or the password is wrong.
    #[instrument(skip(self, password))]
    pub fn authenticate(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = Email::parse(email)?;

        let stored = self
            .identities
            .get_by_email(&email)?
            .ok_or(AuthError::InvalidCredentials)?;
        let hash = stored
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;
        verify_password(password, hash)?;

        tracing::info!(uid = %stored.identity.uid, "Identity logged in");
        self.start_session(stored.identity)
    }

    /// Issue a token for an identity.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if the token cannot be signed.
    pub fn start_session(&self, identity: Identity) -> Result<Session, AuthError> {
        let claims = SessionClaims::issue(identity.uid.clone(), Utc::now());
        let token = self.tokens.encode(&claims)?;
        Ok(Session { identity, token })
    }

    /// Resolve a session token to its identity.
    ///
    /// Any failure (bad signature, expiry, unknown identity, storage trouble)
    /// yields `None`.
    #[must_use]
    pub fn current_identity(&self, token: Option<&str>) -> Option<Identity> {
        let token = token.filter(|t| !t.is_empty())?;

        let claims = match self.tokens.decode(token, Utc::now()) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!(error = %e, "Rejected session token");
                return None;
            }
        };

        match self.identities.get_by_id(&claims.uid) {
            Ok(Some(stored)) => Some(stored.identity),
            Ok(None) => {
                tracing::debug!(uid = %claims.uid, "Session names an unknown identity");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Identity lookup failed while resolving session");
                None
            }
        }
    }

    /// Look up an identity by id.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the lookup fails.
    pub fn identity_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, AuthError> {
        Ok(self.identities.get_by_id(id)?.map(|stored| stored.identity))
    }

    // =========================================================================
    // Account Management
    // =========================================================================

    /// Set an identity's password without checking the old one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if the password is too short, or
    /// `AuthError::UserNotFound` if the identity does not exist.
    #[instrument(skip(self, password))]
    pub fn set_password(&self, id: &IdentityId, password: &str) -> Result<Identity, AuthError> {
        validate_password(password)?;
        let hash = hash_password(password)?;
        self.identities
            .set_password_hash(id, hash)
            .map_err(not_found_as_user)
    }

    /// Change a password after verifying the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the current password is
    /// wrong, `AuthError::WeakPassword` if the new one is too short.
    #[instrument(skip(self, current, new))]
    pub fn change_password(
        &self,
        id: &IdentityId,
        current: &str,
        new: &str,
    ) -> Result<Identity, AuthError> {
        let stored = self
            .identities
            .get_by_id(id)?
            .ok_or(AuthError::UserNotFound)?;
        let hash = stored
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;
        verify_password(current, hash)?;

        self.set_password(id, new)
    }

    /// Update an identity's display name and avatar reference.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidProfile` if the display name is blank.
    #[instrument(skip(self))]
    pub fn update_profile(
        &self,
        id: &IdentityId,
        display_name: &str,
        photo_url: Option<String>,
    ) -> Result<Identity, AuthError> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(AuthError::InvalidProfile("name is required".to_owned()));
        }
        self.identities
            .update_profile(id, display_name.to_owned(), photo_url)
            .map_err(not_found_as_user)
    }
}

fn not_found_as_user(e: RepositoryError) -> AuthError {
    match e {
        RepositoryError::NotFound { .. } => AuthError::UserNotFound,
        other => AuthError::Repository(other),
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let mut salt_bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|_| AuthError::PasswordHash)?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use secrecy::SecretString;

    use super::*;
    use crate::db::identities::IDENTITIES_KEY;
    use crate::storage::{MemoryStorage, Storage};

    const SECRET: &str = "unit-test-session-secret-with-entropy-42";

    fn service_with(storage: Arc<dyn Storage>, seed_password: Option<&str>) -> AuthService {
        let hash = seed_password.map(|p| hash_password(p).unwrap());
        let identities = IdentityRepository::open(storage, hash.as_deref()).unwrap();
        AuthService::new(
            identities,
            SessionTokenCodec::new(SecretString::from(SECRET.to_owned())),
        )
    }

    fn service() -> AuthService {
        service_with(Arc::new(MemoryStorage::new()), None)
    }

    #[test]
    fn test_create_identity_then_resolve_session() {
        let auth = service();
        let session = auth
            .create_identity("new@example.com", "correct horse", "New Person")
            .unwrap();

        assert!(session.identity.uid.as_str().starts_with("user_"));
        assert_eq!(session.identity.role, Role::User);
        assert_eq!(session.identity.display_name.as_deref(), Some("New Person"));

        let current = auth.current_identity(Some(&session.token)).unwrap();
        assert_eq!(current, session.identity);
    }

    #[test]
    fn test_create_identity_duplicate_email_leaves_store_unchanged() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let auth = service_with(Arc::clone(&storage), None);
        let before = storage.get(IDENTITIES_KEY).unwrap();

        let result = auth.create_identity("admin@example.com", "long enough", "Dup");
        assert!(matches!(result, Err(AuthError::UserAlreadyExists)));
        assert_eq!(storage.get(IDENTITIES_KEY).unwrap(), before);
    }

    #[test]
    fn test_create_identity_validates_input() {
        let auth = service();
        assert!(matches!(
            auth.create_identity("nope", "long enough", ""),
            Err(AuthError::InvalidEmail(_))
        ));
        assert!(matches!(
            auth.create_identity("a@b.c", "short", ""),
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[test]
    fn test_authenticate_checks_password() {
        let auth = service();
        auth.create_identity("login@example.com", "secret-pass", "Login")
            .unwrap();

        assert!(auth.authenticate("login@example.com", "secret-pass").is_ok());
        assert!(matches!(
            auth.authenticate("login@example.com", "wrong-pass"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.authenticate("missing@example.com", "secret-pass"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_seed_identity_without_password_cannot_log_in() {
        let auth = service();
        assert!(matches!(
            auth.authenticate("admin@example.com", "anything-at-all"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_seed_password_applies_to_seed_identities() {
        let auth = service_with(Arc::new(MemoryStorage::new()), Some("seed-password"));
        let session = auth.authenticate("admin@example.com", "seed-password").unwrap();
        assert_eq!(session.identity.role, Role::Admin);
    }

    #[test]
    fn test_current_identity_rejects_bad_tokens() {
        let auth = service();
        assert!(auth.current_identity(None).is_none());
        assert!(auth.current_identity(Some("")).is_none());
        assert!(auth.current_identity(Some("garbage")).is_none());

        let other = SessionTokenCodec::new(SecretString::from("x".repeat(40)));
        let foreign = other
            .encode(&SessionClaims::issue(IdentityId::new("admin123"), Utc::now()))
            .unwrap();
        assert!(auth.current_identity(Some(&foreign)).is_none());
    }

    #[test]
    fn test_current_identity_unknown_uid_is_none() {
        let auth = service();
        let ghost = Identity {
            uid: IdentityId::new("ghost"),
            email: None,
            display_name: None,
            photo_url: None,
            role: Role::Admin,
            created_at: Utc::now(),
        };
        let session = auth.start_session(ghost).unwrap();
        assert!(auth.current_identity(Some(&session.token)).is_none());
    }

    #[test]
    fn test_set_and_change_password() {
        let auth = service();
        let id = IdentityId::new("user456");

        auth.set_password(&id, "first-password").unwrap();
        assert!(auth.authenticate("user@example.com", "first-password").is_ok());

        assert!(matches!(
            auth.change_password(&id, "not-the-password", "second-password"),
            Err(AuthError::InvalidCredentials)
        ));
        auth.change_password(&id, "first-password", "second-password")
            .unwrap();
        assert!(auth.authenticate("user@example.com", "second-password").is_ok());

        assert!(matches!(
            auth.set_password(&IdentityId::new("ghost"), "whatever-long"),
            Err(AuthError::UserNotFound)
        ));
    }

    #[test]
    fn test_update_profile_requires_name() {
        let auth = service();
        let id = IdentityId::new("user456");
        assert!(matches!(
            auth.update_profile(&id, "  ", None),
            Err(AuthError::InvalidProfile(_))
        ));
        let updated = auth.update_profile(&id, "Renamed", None).unwrap();
        assert_eq!(updated.display_name.as_deref(), Some("Renamed"));
    }

    #[test]
    fn test_register_identity_with_admin_role() {
        let auth = service();
        let identity = auth
            .register_identity("ops@example.com", "long enough", "Ops", Role::Admin)
            .unwrap();
        assert_eq!(identity.role, Role::Admin);

        let session = auth.authenticate("ops@example.com", "long enough").unwrap();
        assert_eq!(session.identity.uid, identity.uid);
    }
}
