use std::collections::hash_map::RandomState;
use std::collections::HashSet;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::{Mutex, MutexGuard};

use crate::error::StoreError;
use crate::model::common::{ElectionId, IdentityId};

use super::poisoned;

/// Number of lock stripes. Two pairs contend only if they hash to the same stripe.
const STRIPES: usize = 64;

type Pair = (IdentityId, ElectionId);

/// Which elections each voter has already voted in.
///
/// The index is striped: each `(voter, election)` pair lives in exactly one
/// stripe, chosen by hash, and each stripe has its own mutex. Holding a
/// [`PairClaim`] makes check-then-mark atomic for that pair without
/// serialising unrelated pairs.
pub struct VoterElectionIndex {
    stripes: Vec<Mutex<HashSet<Pair>>>,
    hasher: RandomState,
}

/// Exclusive hold on the stripe that owns one `(voter, election)` pair.
pub struct PairClaim<'a> {
    stripe: MutexGuard<'a, HashSet<Pair>>,
    pair: Pair,
}

impl PairClaim<'_> {
    pub fn has_voted(&self) -> bool {
        self.stripe.contains(&self.pair)
    }

    /// Record the pair as voted and release the claim.
    pub fn mark_voted(self) {
        let PairClaim { mut stripe, pair } = self;
        stripe.insert(pair);
    }
}

impl VoterElectionIndex {
    pub fn new() -> Self {
        Self {
            stripes: (0..STRIPES).map(|_| Mutex::new(HashSet::new())).collect(),
            hasher: RandomState::new(),
        }
    }

    fn stripe(&self, pair: &Pair) -> &Mutex<HashSet<Pair>> {
        let mut hasher = self.hasher.build_hasher();
        pair.hash(&mut hasher);
        &self.stripes[(hasher.finish() % STRIPES as u64) as usize]
    }

    /// Take the lock for one pair. Blocks only while another claim on the
    /// same stripe is held, i.e. for at most one commit.
    pub fn claim(
        &self,
        voter_id: &IdentityId,
        election_id: &ElectionId,
    ) -> Result<PairClaim<'_>, StoreError> {
        let pair = (voter_id.clone(), election_id.clone());
        let stripe = self.stripe(&pair).lock().map_err(poisoned("index"))?;
        Ok(PairClaim { stripe, pair })
    }

    pub fn has_voted(
        &self,
        voter_id: &IdentityId,
        election_id: &ElectionId,
    ) -> Result<bool, StoreError> {
        Ok(self.claim(voter_id, election_id)?.has_voted())
    }

    /// Idempotent.
    pub fn mark_voted(
        &self,
        voter_id: &IdentityId,
        election_id: &ElectionId,
    ) -> Result<(), StoreError> {
        self.claim(voter_id, election_id)?.mark_voted();
        Ok(())
    }

    /// Every election the voter has voted in, sorted by ID.
    pub fn voted_elections(&self, voter_id: &IdentityId) -> Result<Vec<ElectionId>, StoreError> {
        let mut elections = Vec::new();
        for stripe in &self.stripes {
            let stripe = stripe.lock().map_err(poisoned("index"))?;
            elections.extend(
                stripe
                    .iter()
                    .filter(|(voter, _)| voter == voter_id)
                    .map(|(_, election)| election.clone()),
            );
        }
        elections.sort();
        Ok(elections)
    }
}

impl Default for VoterElectionIndex {
    fn default() -> Self {
        Self::new()
    }
}
