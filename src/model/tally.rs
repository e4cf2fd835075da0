use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{
    common::{CandidateId, ElectionId},
    election::Election,
    vote::AnonymousVote,
};

/// One candidate's share of an election.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateResult {
    pub candidate_id: CandidateId,
    pub votes: u64,
    /// `votes / totalVotes * 100`, or 0 if nobody has voted yet.
    pub percentage: f64,
}

/// One row of an exported tally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TallyRow {
    pub candidate_name: String,
    pub party: String,
    pub votes: u64,
    /// Rounded to two decimal places.
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionsByStatus {
    pub upcoming: usize,
    pub active: usize,
    pub completed: usize,
}

/// System-wide figures for the administration dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_registered_voters: u64,
    pub total_votes_cast: u64,
    pub turnout_percentage: f64,
    pub elections_by_status: ElectionsByStatus,
    pub votes_by_election: BTreeMap<ElectionId, u64>,
    pub votes_by_county: BTreeMap<String, u64>,
}

/// Everything an observer sees about one election.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionDetails {
    pub election: Election,
    pub results: Vec<CandidateResult>,
    /// Votes in ledger order, without voter identities.
    pub votes: Vec<AnonymousVote>,
    pub total_votes: u64,
    /// Votes per hour of day (UTC), keyed `"00:00"` to `"23:00"`.
    pub hourly_voting: BTreeMap<String, u64>,
}

/// Round a percentage to two decimal places for display.
pub fn round_percentage(percentage: f64) -> f64 {
    (percentage * 100.0).round() / 100.0
}

/// `part / whole * 100`, defined as 0 when `whole` is 0.
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
