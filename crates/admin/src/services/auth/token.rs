//! Signed session tokens.
//!
//! A token is `base64url(json claims) "." base64url(hmac-sha256(payload))`.
//! The payload is readable by anyone holding the token; the MAC keeps it from
//! being forged or altered without the session secret.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;

use crate::models::SessionClaims;

type HmacSha256 = Hmac<Sha256>;

/// Reasons a token fails to decode.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Not of the form `payload.signature`, or not valid base64/JSON.
    #[error("malformed session token")]
    Malformed,

    /// Signature does not match the payload.
    #[error("session token signature mismatch")]
    BadSignature,

    /// Token is past its expiry.
    #[error("session token expired")]
    Expired,

    /// The secret could not key the MAC.
    #[error("invalid session key")]
    Key,
}

/// Encodes and verifies session tokens with a shared secret.
#[derive(Clone)]
pub struct SessionTokenCodec {
    secret: SecretString,
}

impl std::fmt::Debug for SessionTokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokenCodec")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl SessionTokenCodec {
    #[must_use]
    pub const fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Encode and sign a set of claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Key` if the MAC cannot be keyed, or
    /// `TokenError::Malformed` if the claims cannot be serialized.
    pub fn encode(&self, claims: &SessionClaims) -> Result<String, TokenError> {
        let json = serde_json::to_vec(claims).map_err(|_| TokenError::Malformed)?;
        let payload = URL_SAFE_NO_PAD.encode(json);

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{payload}.{signature}"))
    }

    /// Verify a token and return its claims if it is still valid at `now`.
    ///
    /// # Errors
    ///
    /// Returns a `TokenError` describing why the token was rejected.
    pub fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError> {
        let (payload, signature) = token.trim().split_once('.').ok_or(TokenError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let claims: SessionClaims =
            serde_json::from_slice(&json).map_err(|_| TokenError::Malformed)?;

        if claims.is_expired(now) {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| TokenError::Key)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use dashboard_core::IdentityId;

    use super::*;
    use crate::models::session::SESSION_TTL_SECS;

    fn codec(secret: &str) -> SessionTokenCodec {
        SessionTokenCodec::new(SecretString::from(secret.to_owned()))
    }

    #[test]
    fn test_token_decodes_to_identity() {
        let now = Utc::now();
        let codec = codec("test-secret-for-session-tokens-0001");
        let claims = SessionClaims::issue(IdentityId::new("admin123"), now);

        let token = codec.encode(&claims).unwrap();
        let decoded = codec.decode(&token, now).unwrap();
        assert_eq!(decoded.uid.as_str(), "admin123");
    }

    #[test]
    fn test_payload_is_reversible_without_secret() {
        let now = Utc::now();
        let token = codec("test-secret-for-session-tokens-0001")
            .encode(&SessionClaims::issue(IdentityId::new("user456"), now))
            .unwrap();

        let (payload, _) = token.split_once('.').unwrap();
        let json = URL_SAFE_NO_PAD.decode(payload).unwrap();
        let claims: SessionClaims = serde_json::from_slice(&json).unwrap();
        assert_eq!(claims.uid.as_str(), "user456");
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let now = Utc::now();
        let token = codec("test-secret-for-session-tokens-0001")
            .encode(&SessionClaims::issue(IdentityId::new("admin123"), now))
            .unwrap();

        let result = codec("another-secret-for-session-tokens-02").decode(&token, now);
        assert_eq!(result.unwrap_err(), TokenError::BadSignature);
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let now = Utc::now();
        let codec = codec("test-secret-for-session-tokens-0001");
        let token = codec
            .encode(&SessionClaims::issue(IdentityId::new("user456"), now))
            .unwrap();
        let (_, signature) = token.split_once('.').unwrap();

        let forged_claims = SessionClaims::issue(IdentityId::new("admin123"), now);
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap());
        let forged = format!("{forged_payload}.{signature}");

        assert_eq!(codec.decode(&forged, now).unwrap_err(), TokenError::BadSignature);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let now = Utc::now();
        let codec = codec("test-secret-for-session-tokens-0001");
        let token = codec
            .encode(&SessionClaims::issue(IdentityId::new("admin123"), now))
            .unwrap();

        let later = now + Duration::seconds(SESSION_TTL_SECS + 1);
        assert_eq!(codec.decode(&token, later).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn test_garbage_is_malformed() {
        let codec = codec("test-secret-for-session-tokens-0001");
        assert_eq!(codec.decode("", Utc::now()).unwrap_err(), TokenError::Malformed);
        assert_eq!(
            codec.decode("no-dot-here", Utc::now()).unwrap_err(),
            TokenError::Malformed
        );
        assert_eq!(
            codec.decode("abc.!!!", Utc::now()).unwrap_err(),
            TokenError::Malformed
        );
    }
}
