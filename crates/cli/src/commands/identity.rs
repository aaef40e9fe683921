//! Identity management commands.
//!
//! Seed identities start without a password unless
//! `DASHBOARD_SEED_PASSWORD` was set when they were first written; use
//! `identity set-password` to let them log in.
//!
//! Stop the server before running these against its data directory. The
//! server reads `mockUsers` once at startup and rewrites the whole list on
//! its next identity change, so edits made while it runs are not seen and
//! are then overwritten.

use secrecy::{ExposeSecret, SecretString};

use dashboard_core::{Email, Role};

use super::{CommandError, open_state};

/// Create a new identity with a password.
///
/// # Errors
///
/// Returns an error if the email is invalid or taken, or the password is
/// too short.
pub fn create(
    email: &str,
    name: &str,
    password: &SecretString,
    role: Role,
) -> Result<(), CommandError> {
    let state = open_state()?;
    let identity = state
        .auth()
        .register_identity(email, password.expose_secret(), name, role)?;

    tracing::info!(
        uid = %identity.uid,
        email,
        role = %identity.role,
        "Identity created"
    );
    Ok(())
}

/// Set the password of the identity with `email`.
///
/// # Errors
///
/// Returns `CommandError::UnknownIdentity` if no identity has this email.
pub fn set_password(email: &str, password: &SecretString) -> Result<(), CommandError> {
    let state = open_state()?;
    let email = Email::parse(email).map_err(dashboard_admin::services::AuthError::from)?;

    let stored = state
        .auth()
        .identities()
        .get_by_email(&email)?
        .ok_or_else(|| CommandError::UnknownIdentity(email.to_string()))?;

    let identity = state
        .auth()
        .set_password(&stored.identity.uid, password.expose_secret())?;
    tracing::info!(uid = %identity.uid, "Password updated");
    Ok(())
}

/// Log every identity.
///
/// # Errors
///
/// Returns an error if the identity list cannot be read.
pub fn list() -> Result<(), CommandError> {
    let state = open_state()?;
    let identities = state.auth().identities().list()?;

    for identity in &identities {
        tracing::info!(
            uid = %identity.uid,
            email = identity.email.as_ref().map_or("-", Email::as_str),
            name = identity.display_name.as_deref().unwrap_or("-"),
            role = %identity.role,
            "Identity"
        );
    }
    tracing::info!(count = identities.len(), "Identities listed");
    Ok(())
}
