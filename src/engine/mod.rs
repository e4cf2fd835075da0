//! The vote-casting and tallying engine.
//!
//! [`Engine`] is a cheap, cloneable handle over a shared [`Store`]. Rocket
//! manages one, and the background tasks hold clones of it.

use std::sync::Arc;

use crate::error::{AuthError, StoreError, VoteError};
use crate::model::{
    common::{ElectionId, IdentityId, Role},
    election::Election,
    identity::{Identity, PersonalDetails},
    session::Session,
};
use crate::store::Store;

mod casting;
mod tally;

#[derive(Clone)]
pub struct Engine {
    store: Arc<Store>,
    registered_voters: Option<u64>,
}

impl Engine {
    pub fn new(store: Store) -> Self {
        Self {
            store: Arc::new(store),
            registered_voters: None,
        }
    }

    /// Report turnout against a fixed electorate size instead of the number
    /// of registered voter identities.
    pub fn with_registered_voters(mut self, registered_voters: Option<u64>) -> Self {
        self.registered_voters = registered_voters;
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Sign in with a national ID and password.
    pub fn authenticate(&self, national_id: &str, password: &str) -> Result<Session, AuthError> {
        let result = self
            .store
            .sessions
            .authenticate(&self.store.identities, national_id, password);
        if let Err(AuthError::InvalidCredentials) = result {
            debug!("Rejected sign-in attempt");
        }
        result
    }

    /// End a session. Unknown tokens are ignored.
    pub fn logout(&self, token: &str) -> Result<(), StoreError> {
        self.store.sessions.invalidate(token)
    }

    /// Resolve a bearer token into its session.
    pub fn session(&self, token: &str) -> Result<Session, VoteError> {
        self.store
            .sessions
            .validate(token)?
            .ok_or(VoteError::InvalidSession)
    }

    /// Register a new, unverified voter.
    pub fn register(
        &self,
        details: PersonalDetails,
        password: &str,
    ) -> Result<IdentityId, AuthError> {
        let identity = Identity::new(IdentityId::generate(), details, Role::Voter, password)?;
        let id = self.store.identities.register(identity)?;
        info!("New voter {id} awaiting verification");
        Ok(id)
    }

    /// Mark an identity as verified so it can sign in. Returns false for an unknown identity.
    pub fn verify_identity(&self, id: &IdentityId) -> Result<bool, StoreError> {
        let verified = self.store.identities.verify(id)?;
        if verified {
            info!("Verified identity {id}");
        }
        Ok(verified)
    }

    pub fn election(&self, id: &ElectionId) -> Option<Election> {
        self.store.catalog.get(id)
    }

    pub fn elections(&self) -> Vec<Election> {
        self.store.catalog.list_all()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::seed::{DEMO_ADMIN, DEMO_VOTER};

    #[test]
    fn register_verify_then_sign_in() {
        let engine = Engine::new(Store::example());
        let details = PersonalDetails::example("30303030", "Kisumu");
        let id = engine.register(details.clone(), "letmein").unwrap();

        assert!(matches!(
            engine.authenticate("30303030", "letmein"),
            Err(AuthError::Unverified)
        ));
        assert!(matches!(
            engine.register(details, "again"),
            Err(AuthError::AlreadyRegistered)
        ));

        assert!(engine.verify_identity(&id).unwrap());
        let session = engine.authenticate("30303030", "letmein").unwrap();
        assert_eq!(session.identity_id, id);
        assert_eq!(session.role, Role::Voter);
    }

    #[test]
    fn logout_invalidates_session() {
        let engine = Engine::new(Store::example());
        let session = engine
            .authenticate(DEMO_ADMIN.national_id, DEMO_ADMIN.password)
            .unwrap();
        let token = session.token.as_str();
        assert_eq!(engine.session(token).unwrap().role, Role::Admin);

        engine.logout(token).unwrap();
        assert!(matches!(engine.session(token), Err(VoteError::InvalidSession)));
        engine.logout(token).unwrap();
    }

    #[test]
    fn garbage_tokens_are_invalid_sessions() {
        let engine = Engine::new(Store::example());
        engine
            .authenticate(DEMO_VOTER.national_id, DEMO_VOTER.password)
            .unwrap();
        for token in ["", "Bearer", "not-a-token", "🗳️"] {
            assert!(matches!(engine.session(token), Err(VoteError::InvalidSession)));
        }
    }
}
