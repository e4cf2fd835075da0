use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::common::{CandidateId, ElectionId, IdentityId, VoteId};

/// Where a vote came from. Supplied by the transport layer; the biometric flag
/// is the verdict of an external verifier and is recorded as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    pub ip_address: String,
    pub device_fingerprint: String,
    pub biometric_verified: bool,
}

/// A single immutable vote record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub id: VoteId,
    pub election_id: ElectionId,
    pub voter_id: IdentityId,
    pub candidate_id: CandidateId,
    pub cast_at: DateTime<Utc>,
    pub provenance: Provenance,
}

/// A vote with the voter's identity stripped, safe to show to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnonymousVote {
    pub id: VoteId,
    pub candidate_id: CandidateId,
    pub cast_at: DateTime<Utc>,
    pub biometric_verified: bool,
}

impl From<&Vote> for AnonymousVote {
    fn from(vote: &Vote) -> Self {
        Self {
            id: vote.id.clone(),
            candidate_id: vote.candidate_id.clone(),
            cast_at: vote.cast_at,
            biometric_verified: vote.provenance.biometric_verified,
        }
    }
}

/// Proof of a successful cast, returned to the voter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    pub vote_id: VoteId,
    pub election_id: ElectionId,
    pub cast_at: DateTime<Utc>,
}
