use chrono::{DateTime, Duration, Utc};

use crate::model::common::{IdentityId, Role, SessionToken};

/// An authenticated session: proof that `identity_id` signed in recently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity_id: IdentityId,
    pub token: SessionToken,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Issue a new session with a fresh token, valid for `ttl` from `now`.
    pub fn issue(identity_id: IdentityId, role: Role, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            identity_id,
            token: SessionToken::generate(),
            role,
            issued_at: now,
            expires_at: now + ttl,
        }
    }

    /// A session is valid strictly before its expiry instant.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}
