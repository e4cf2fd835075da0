use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::error::{AuthError, StoreError};
use crate::model::{
    common::{IdentityId, Role},
    identity::Identity,
};

use super::poisoned;

#[derive(Default)]
struct Registry {
    by_id: HashMap<IdentityId, Identity>,
    by_national_id: HashMap<String, IdentityId>,
    by_email: HashMap<String, IdentityId>,
}

/// Registered identities, indexed by ID, national ID and email.
pub struct IdentityRegistry {
    registry: RwLock<Registry>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
        }
    }

    /// Insert a new identity. National IDs and emails must be unique;
    /// emails are compared case-insensitively.
    pub fn register(&self, identity: Identity) -> Result<IdentityId, AuthError> {
        let mut registry = self.registry.write().map_err(poisoned("identity"))?;
        let email = identity.details.email.to_lowercase();
        if registry.by_id.contains_key(&identity.id)
            || registry
                .by_national_id
                .contains_key(&identity.details.national_id)
            || registry.by_email.contains_key(&email)
        {
            return Err(AuthError::AlreadyRegistered);
        }

        let id = identity.id.clone();
        registry
            .by_national_id
            .insert(identity.details.national_id.clone(), id.clone());
        registry.by_email.insert(email, id.clone());
        registry.by_id.insert(id.clone(), identity);
        debug!("Registered identity {id}");
        Ok(id)
    }

    pub fn get(&self, id: &IdentityId) -> Result<Option<Identity>, StoreError> {
        let registry = self.registry.read().map_err(poisoned("identity"))?;
        Ok(registry.by_id.get(id).cloned())
    }

    pub fn find_by_national_id(&self, national_id: &str) -> Result<Option<Identity>, StoreError> {
        let registry = self.registry.read().map_err(poisoned("identity"))?;
        Ok(registry
            .by_national_id
            .get(national_id)
            .and_then(|id| registry.by_id.get(id))
            .cloned())
    }

    /// Mark an identity as verified. Returns false if no such identity exists.
    pub fn verify(&self, id: &IdentityId) -> Result<bool, StoreError> {
        let mut registry = self.registry.write().map_err(poisoned("identity"))?;
        Ok(match registry.by_id.get_mut(id) {
            Some(identity) => {
                identity.verified = true;
                true
            }
            None => false,
        })
    }

    pub fn record_login(&self, id: &IdentityId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut registry = self.registry.write().map_err(poisoned("identity"))?;
        if let Some(identity) = registry.by_id.get_mut(id) {
            identity.last_login = Some(at);
        }
        Ok(())
    }

    pub fn count_by_role(&self, role: Role) -> Result<usize, StoreError> {
        let registry = self.registry.read().map_err(poisoned("identity"))?;
        Ok(registry.by_id.values().filter(|i| i.role == role).count())
    }

    /// Snapshot of every identity's county, for regional reporting.
    pub fn counties(&self) -> Result<HashMap<IdentityId, String>, StoreError> {
        let registry = self.registry.read().map_err(poisoned("identity"))?;
        Ok(registry
            .by_id
            .iter()
            .map(|(id, identity)| (id.clone(), identity.details.county.clone()))
            .collect())
    }

    /// All identities, sorted by ID.
    pub fn list(&self) -> Result<Vec<Identity>, StoreError> {
        let registry = self.registry.read().map_err(poisoned("identity"))?;
        let mut all = registry.by_id.values().cloned().collect::<Vec<_>>();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }
}

impl Default for IdentityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
