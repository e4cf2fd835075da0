use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use crate::model::{
    common::{ElectionId, ElectionStatus},
    election::{Election, ElectionSpec},
};

/// One election as held by the catalog: immutable content plus two atomics.
struct CatalogEntry {
    spec: ElectionSpec,
    status: AtomicU8,
    total_votes: AtomicU64,
}

impl CatalogEntry {
    fn snapshot(&self) -> Election {
        Election {
            spec: self.spec.clone(),
            status: ElectionStatus::from_u8(self.status.load(Ordering::SeqCst)),
            total_votes: self.total_votes.load(Ordering::Relaxed),
        }
    }
}

/// The fixed set of elections.
///
/// The set itself never changes after construction, so lookups take no locks.
/// Only the status and the vote counter of each election are mutable.
pub struct ElectionCatalog {
    entries: Vec<CatalogEntry>,
    positions: HashMap<ElectionId, usize>,
}

impl ElectionCatalog {
    /// Build the catalog. Order is preserved; a repeated ID is ignored.
    pub fn new(elections: Vec<(ElectionSpec, ElectionStatus)>) -> Self {
        let mut entries = Vec::with_capacity(elections.len());
        let mut positions = HashMap::with_capacity(elections.len());
        for (spec, status) in elections {
            if positions.contains_key(&spec.id) {
                warn!("Ignoring duplicate election {} in catalog", spec.id);
                continue;
            }
            positions.insert(spec.id.clone(), entries.len());
            entries.push(CatalogEntry {
                spec,
                status: AtomicU8::new(status.to_u8()),
                total_votes: AtomicU64::new(0),
            });
        }
        Self { entries, positions }
    }

    fn entry(&self, id: &ElectionId) -> Option<&CatalogEntry> {
        self.positions.get(id).map(|&pos| &self.entries[pos])
    }

    /// IDs of every election, in catalog order.
    pub fn ids(&self) -> Vec<ElectionId> {
        self.entries.iter().map(|e| e.spec.id.clone()).collect()
    }

    pub fn get(&self, id: &ElectionId) -> Option<Election> {
        self.entry(id).map(CatalogEntry::snapshot)
    }

    /// The immutable content of an election, without copying it.
    pub fn spec(&self, id: &ElectionId) -> Option<&ElectionSpec> {
        self.entry(id).map(|e| &e.spec)
    }

    pub fn list_all(&self) -> Vec<Election> {
        self.entries.iter().map(CatalogEntry::snapshot).collect()
    }

    /// Active elections in catalog order.
    pub fn list_active(&self) -> Vec<Election> {
        self.list_all()
            .into_iter()
            .filter(|e| e.status == ElectionStatus::Active)
            .collect()
    }

    pub fn status(&self, id: &ElectionId) -> Option<ElectionStatus> {
        self.entry(id)
            .map(|e| ElectionStatus::from_u8(e.status.load(Ordering::SeqCst)))
    }

    pub fn total_votes(&self, id: &ElectionId) -> Option<u64> {
        self.entry(id).map(|e| e.total_votes.load(Ordering::Relaxed))
    }

    /// Atomically bump the election's vote counter, returning the new total.
    ///
    /// Must only be called by the casting engine from inside the election's
    /// ledger commit, which is what keeps the counter in step with the ledger.
    pub(crate) fn increment_total(&self, id: &ElectionId) -> Option<u64> {
        self.entry(id)
            .map(|e| e.total_votes.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Open voting. Only an upcoming election can be opened.
    /// Returns the status after the attempt, or `None` for an unknown election.
    pub fn open(&self, id: &ElectionId) -> Option<ElectionStatus> {
        self.transition(id, ElectionStatus::Upcoming, ElectionStatus::Active)
    }

    /// Close voting for good. Closing a completed election is a no-op.
    pub fn close(&self, id: &ElectionId) -> Option<ElectionStatus> {
        let entry = self.entry(id)?;
        let previous =
            ElectionStatus::from_u8(entry.status.swap(ElectionStatus::Completed.to_u8(), Ordering::SeqCst));
        if previous != ElectionStatus::Completed {
            info!("Election {id} closed (was {previous:?})");
        }
        Some(ElectionStatus::Completed)
    }

    fn transition(
        &self,
        id: &ElectionId,
        from: ElectionStatus,
        to: ElectionStatus,
    ) -> Option<ElectionStatus> {
        let entry = self.entry(id)?;
        match entry.status.compare_exchange(
            from.to_u8(),
            to.to_u8(),
            Ordering::SeqCst,
            Ordering::SeqCst,
        ) {
            Ok(_) => {
                info!("Election {id} moved from {from:?} to {to:?}");
                Some(to)
            }
            Err(actual) => Some(ElectionStatus::from_u8(actual)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ElectionCatalog {
        ElectionCatalog::new(vec![
            (ElectionSpec::example("E1", &["A", "B"]), ElectionStatus::Active),
            (ElectionSpec::example("E2", &["C"]), ElectionStatus::Upcoming),
            (ElectionSpec::example("E3", &["D"]), ElectionStatus::Active),
            (ElectionSpec::example("E1", &["X"]), ElectionStatus::Completed),
        ])
    }

    #[test]
    fn list_active_keeps_catalog_order() {
        let catalog = catalog();
        let active = catalog
            .list_active()
            .into_iter()
            .map(|e| e.spec.id)
            .collect::<Vec<_>>();
        assert_eq!(active, vec![ElectionId::from("E1"), ElectionId::from("E3")]);
    }

    #[test]
    fn duplicate_ids_ignored() {
        let catalog = catalog();
        assert_eq!(catalog.ids().len(), 3);
        let e1 = catalog.get(&ElectionId::from("E1")).unwrap();
        assert_eq!(e1.candidates.len(), 2);
        assert_eq!(e1.status, ElectionStatus::Active);
    }

    #[test]
    fn increment_total_counts() {
        let catalog = catalog();
        let id = ElectionId::from("E1");
        assert_eq!(catalog.increment_total(&id), Some(1));
        assert_eq!(catalog.increment_total(&id), Some(2));
        assert_eq!(catalog.get(&id).unwrap().total_votes, 2);
        assert_eq!(catalog.increment_total(&ElectionId::from("nope")), None);
    }

    #[test]
    fn lifecycle_transitions() {
        let catalog = catalog();
        let e2 = ElectionId::from("E2");
        assert_eq!(catalog.open(&e2), Some(ElectionStatus::Active));
        // Already active: opening again reports the current status.
        assert_eq!(catalog.open(&e2), Some(ElectionStatus::Active));
        assert_eq!(catalog.close(&e2), Some(ElectionStatus::Completed));
        // Completed is terminal.
        assert_eq!(catalog.open(&e2), Some(ElectionStatus::Completed));
        assert_eq!(catalog.close(&ElectionId::from("nope")), None);
    }
}
