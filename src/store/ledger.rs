use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::error::StoreError;
use crate::model::{
    common::{ElectionId, VoteId},
    vote::Vote,
};

use super::poisoned;

/// One election's slice of the ledger.
#[derive(Default)]
struct Partition {
    votes: Vec<Vote>,
    ids: HashSet<VoteId>,
}

/// Append-only store of vote records, partitioned by election.
///
/// Partitions are created up front for the catalog's elections and never
/// added or removed, so the partition map needs no lock of its own; each
/// partition is guarded by its own `RwLock`. There is no update or delete.
pub struct VoteLedger {
    partitions: HashMap<ElectionId, RwLock<Partition>>,
}

impl VoteLedger {
    pub fn new(elections: impl IntoIterator<Item = ElectionId>) -> Self {
        Self {
            partitions: elections
                .into_iter()
                .map(|id| (id, RwLock::new(Partition::default())))
                .collect(),
        }
    }

    fn partition(&self, election_id: &ElectionId) -> Result<&RwLock<Partition>, StoreError> {
        self.partitions
            .get(election_id)
            .ok_or_else(|| StoreError::MissingPartition(election_id.clone()))
    }

    /// Append a vote.
    pub fn append(&self, vote: Vote) -> Result<(), StoreError> {
        self.append_with(vote, || Ok(()))
    }

    /// Append a vote, running `on_commit` while the partition is write-locked.
    ///
    /// The vote becomes visible only if `on_commit` succeeds, and readers
    /// cannot observe the gap between the two. A colliding ID is rejected
    /// before `on_commit` runs.
    pub fn append_with<F>(&self, vote: Vote, on_commit: F) -> Result<(), StoreError>
    where
        F: FnOnce() -> Result<(), StoreError>,
    {
        let mut partition = self
            .partition(&vote.election_id)?
            .write()
            .map_err(poisoned("ledger"))?;
        if partition.ids.contains(&vote.id) {
            return Err(StoreError::DuplicateId(vote.id));
        }
        on_commit()?;
        partition.ids.insert(vote.id.clone());
        partition.votes.push(vote);
        Ok(())
    }

    /// All votes for an election, in insertion order. Unknown elections have none.
    pub fn by_election(&self, election_id: &ElectionId) -> Result<Vec<Vote>, StoreError> {
        match self.partitions.get(election_id) {
            Some(partition) => Ok(partition.read().map_err(poisoned("ledger"))?.votes.clone()),
            None => Ok(Vec::new()),
        }
    }

    /// Run `f` over an election's votes while holding the partition's read lock.
    ///
    /// No vote can be appended (and so no counter bumped) while `f` runs.
    pub fn snapshot<R>(
        &self,
        election_id: &ElectionId,
        f: impl FnOnce(&[Vote]) -> R,
    ) -> Result<R, StoreError> {
        let partition = self
            .partition(election_id)?
            .read()
            .map_err(poisoned("ledger"))?;
        Ok(f(&partition.votes))
    }

    pub fn len(&self, election_id: &ElectionId) -> Result<usize, StoreError> {
        self.snapshot(election_id, |votes| votes.len())
    }

    /// Total votes across every election.
    pub fn total(&self) -> Result<usize, StoreError> {
        self.partitions.values().try_fold(0, |acc, partition| {
            Ok(acc + partition.read().map_err(poisoned("ledger"))?.votes.len())
        })
    }
}
