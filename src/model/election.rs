use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::common::{CandidateId, ElectionId, ElectionStatus};

/// A candidate standing in an election. Immutable once the election is published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub party: String,
    pub position: String,
    pub biography: String,
    pub manifesto: String,
    pub image_ref: String,
}

/// The immutable part of an election: everything except its status and vote counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionSpec {
    pub id: ElectionId,
    pub title: String,
    pub description: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub candidates: Vec<Candidate>,
}

impl ElectionSpec {
    /// Look up a candidate by ID.
    pub fn candidate(&self, candidate_id: &CandidateId) -> Option<&Candidate> {
        self.candidates.iter().find(|c| &c.id == candidate_id)
    }
}

/// A point-in-time view of an election from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Election {
    #[serde(flatten)]
    pub spec: ElectionSpec,
    pub status: ElectionStatus,
    pub total_votes: u64,
}

impl Election {
    /// Only active elections accept votes. The scheduler moves the status at the
    /// window bounds, and an admin may open or close outside them.
    pub fn accepts_votes(&self) -> bool {
        self.status == ElectionStatus::Active
    }
}

impl std::ops::Deref for Election {
    type Target = ElectionSpec;

    fn deref(&self) -> &Self::Target {
        &self.spec
    }
}


#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn accepts_votes_only_when_active() {
        let mut spec = ElectionSpec::example("E1", &["A", "B"]);
        // Opened ahead of its scheduled start.
        spec.start_at = Utc::now() + Duration::days(1);
        spec.end_at = spec.start_at + Duration::days(1);
        let mut election = Election {
            spec,
            status: ElectionStatus::Active,
            total_votes: 0,
        };
        assert!(election.accepts_votes());

        election.status = ElectionStatus::Upcoming;
        assert!(!election.accepts_votes());
        election.status = ElectionStatus::Completed;
        assert!(!election.accepts_votes());
    }

    #[test]
    fn candidate_lookup() {
        let spec = ElectionSpec::example("E1", &["A", "B"]);
        assert_eq!(spec.candidate(&CandidateId::from("B")).unwrap().name, "Candidate B");
        assert!(spec.candidate(&CandidateId::from("C")).is_none());
    }
}
