//! Session token payload.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use dashboard_core::IdentityId;

/// How long a session token stays valid.
pub const SESSION_TTL_SECS: i64 = 86_400;

/// Claims carried inside a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Identity the session belongs to.
    pub uid: IdentityId,
    /// Expiry as unix seconds.
    pub exp: i64,
}

impl SessionClaims {
    /// Claims for `uid` expiring one TTL after `now`.
    #[must_use]
    pub fn issue(uid: IdentityId, now: DateTime<Utc>) -> Self {
        Self {
            uid,
            exp: (now + Duration::seconds(SESSION_TTL_SECS)).timestamp(),
        }
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_expiry() {
        let now = Utc::now();
        let claims = SessionClaims::issue(IdentityId::new("u1"), now);
        assert_eq!(claims.exp - now.timestamp(), SESSION_TTL_SECS);
        assert!(!claims.is_expired(now));
        assert!(claims.is_expired(now + Duration::seconds(SESSION_TTL_SECS)));
    }
}
