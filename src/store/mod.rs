//! In-memory stores backing the engine.
//!
//! Every store is an explicit object owned by [`Store`], constructed at
//! startup and injected into the [`Engine`](crate::engine::Engine). Nothing
//! here is global, so tests can build as many independent stores as they like.
//!
//! Each store reports a poisoned lock as [`StoreError::Poisoned`] rather than
//! panicking, which the engine surfaces as a retryable storage failure.

use chrono::Duration;

use crate::error::StoreError;
use crate::model::{common::ElectionStatus, election::ElectionSpec};

mod catalog;
mod identities;
mod index;
mod ledger;
pub mod seed;
mod sessions;

pub use catalog::ElectionCatalog;
pub use identities::IdentityRegistry;
pub use index::{PairClaim, VoterElectionIndex};
pub use ledger::VoteLedger;
pub use sessions::SessionStore;

/// All state of a running voting system.
pub struct Store {
    pub identities: IdentityRegistry,
    pub sessions: SessionStore,
    pub catalog: ElectionCatalog,
    pub ledger: VoteLedger,
    pub index: VoterElectionIndex,
}

impl Store {
    /// Create an empty store (no identities, no sessions, no votes) over the
    /// given fixed set of elections.
    pub fn new(elections: Vec<(ElectionSpec, ElectionStatus)>, session_ttl: Duration) -> Self {
        let catalog = ElectionCatalog::new(elections);
        let ledger = VoteLedger::new(catalog.ids());
        Self {
            identities: IdentityRegistry::new(),
            sessions: SessionStore::new(session_ttl),
            catalog,
            ledger,
            index: VoterElectionIndex::new(),
        }
    }
}

/// Map a poisoned-lock error from the named store into a [`StoreError`].
pub(crate) fn poisoned<E>(store: &'static str) -> impl FnOnce(E) -> StoreError {
    move |_| {
        error!("The {store} lock is poisoned; a writer panicked mid-update");
        StoreError::Poisoned(store)
    }
}
