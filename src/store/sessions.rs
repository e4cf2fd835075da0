use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};

use crate::error::{AuthError, StoreError};
use crate::model::{common::SessionToken, identity::verify_password_unknown, session::Session};

use super::{poisoned, IdentityRegistry};

/// Live sessions, keyed by their bearer token.
///
/// Expired sessions are never handed out: they are evicted lazily when looked
/// up, and in bulk by [`SessionStore::purge_expired`].
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionToken, Session>>,
    ttl: Duration,
}

impl SessionStore {
    /// Create an empty store issuing sessions valid for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Check a national ID and password against the registry and open a new session.
    ///
    /// An unknown national ID and a wrong password produce the same error.
    pub fn authenticate(
        &self,
        identities: &IdentityRegistry,
        national_id: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let identity = match identities.find_by_national_id(national_id)? {
            Some(identity) => identity,
            None => {
                verify_password_unknown(password);
                return Err(AuthError::InvalidCredentials);
            }
        };
        if !identity.verify_password(password) {
            return Err(AuthError::InvalidCredentials);
        }
        if !identity.verified {
            return Err(AuthError::Unverified);
        }

        let now = Utc::now();
        let session = Session::issue(identity.id.clone(), identity.role, now, self.ttl);
        // Both the login record and the session land, or neither does.
        let mut sessions = self.sessions.write().map_err(poisoned("session"))?;
        identities.record_login(&identity.id, now)?;
        sessions.insert(session.token.clone(), session.clone());
        drop(sessions);

        info!(
            "Opened {} session for {}, expires {}",
            session.role, session.identity_id, session.expires_at
        );
        Ok(session)
    }

    /// Look up a session by token as of now.
    pub fn validate(&self, token: &str) -> Result<Option<Session>, StoreError> {
        self.validate_at(token, Utc::now())
    }

    /// Look up a session by token as of `now`. Missing and expired sessions
    /// are indistinguishable to the caller.
    pub fn validate_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError> {
        {
            let sessions = self.sessions.read().map_err(poisoned("session"))?;
            match sessions.get(token) {
                None => return Ok(None),
                Some(session) if session.is_valid_at(now) => return Ok(Some(session.clone())),
                Some(_) => {}
            }
        }

        // Expired: evict it, unless it has been replaced in the meantime.
        let mut sessions = self.sessions.write().map_err(poisoned("session"))?;
        if let Some(session) = sessions.get(token) {
            if !session.is_valid_at(now) {
                trace!("Evicting expired session for {}", session.identity_id);
                sessions.remove(token);
            }
        }
        Ok(None)
    }

    /// Destroy a session. Unknown tokens are ignored.
    pub fn invalidate(&self, token: &str) -> Result<(), StoreError> {
        let removed = self
            .sessions
            .write()
            .map_err(poisoned("session"))?
            .remove(token);
        if let Some(session) = removed {
            info!("Closed session for {}", session.identity_id);
        }
        Ok(())
    }

    /// Drop every session that has expired as of `now`, returning how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut sessions = self.sessions.write().map_err(poisoned("session"))?;
        let before = sessions.len();
        sessions.retain(|_, session| session.is_valid_at(now));
        Ok(before - sessions.len())
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.sessions.read().map_err(poisoned("session"))?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}
