use std::collections::{BTreeMap, HashMap};

use chrono::Timelike;

use crate::error::TallyError;
use crate::model::{
    common::{CandidateId, ElectionId, ElectionStatus, Role},
    election::{Election, ElectionSpec},
    tally::{
        percentage, round_percentage, AdminStats, CandidateResult, ElectionDetails,
        ElectionsByStatus, TallyRow,
    },
    vote::{AnonymousVote, Vote},
};

use super::Engine;

/// County reported for votes whose voter is no longer in the registry.
const UNKNOWN_COUNTY: &str = "Unknown";

impl Engine {
    /// Per-candidate results in candidate order.
    pub fn results_for(&self, election_id: &ElectionId) -> Result<Vec<CandidateResult>, TallyError> {
        let spec = self.spec(election_id)?;
        let results = self
            .store
            .ledger
            .snapshot(election_id, |votes| self.count(spec, votes))?;
        debug!("Computed results for {election_id}");
        Ok(results)
    }

    /// Results joined with candidate names and parties, ready to be written out.
    pub fn export_tally(&self, election_id: &ElectionId) -> Result<Vec<TallyRow>, TallyError> {
        let spec = self.spec(election_id)?;
        let results = self.results_for(election_id)?;
        Ok(spec
            .candidates
            .iter()
            .zip(results)
            .map(|(candidate, result)| TallyRow {
                candidate_name: candidate.name.clone(),
                party: candidate.party.clone(),
                votes: result.votes,
                percentage: round_percentage(result.percentage),
            })
            .collect())
    }

    /// Turnout and vote breakdowns across every election.
    ///
    /// Each election is read consistently, but different elections may be
    /// read at slightly different moments.
    pub fn admin_stats(&self) -> Result<AdminStats, TallyError> {
        let counties = self.store.identities.counties()?;
        let mut elections_by_status = ElectionsByStatus::default();
        let mut votes_by_election = BTreeMap::new();
        let mut votes_by_county = BTreeMap::<String, u64>::new();
        let mut total_votes_cast = 0;

        for election in self.store.catalog.list_all() {
            match election.status {
                ElectionStatus::Upcoming => elections_by_status.upcoming += 1,
                ElectionStatus::Active => elections_by_status.active += 1,
                ElectionStatus::Completed => elections_by_status.completed += 1,
            }

            let cast = self.store.ledger.snapshot(&election.id, |votes| {
                for vote in votes {
                    let county = counties
                        .get(&vote.voter_id)
                        .map(String::as_str)
                        .unwrap_or(UNKNOWN_COUNTY);
                    *votes_by_county.entry(county.to_string()).or_default() += 1;
                }
                votes.len() as u64
            })?;
            total_votes_cast += cast;
            votes_by_election.insert(election.spec.id, cast);
        }

        let total_registered_voters = match self.registered_voters {
            Some(registered) => registered,
            None => self.store.identities.count_by_role(Role::Voter)? as u64,
        };

        Ok(AdminStats {
            total_registered_voters,
            total_votes_cast,
            turnout_percentage: percentage(total_votes_cast, total_registered_voters),
            elections_by_status,
            votes_by_election,
            votes_by_county,
        })
    }

    /// The election with its results, anonymised votes and an hourly histogram,
    /// all from one consistent read.
    pub fn election_details(&self, election_id: &ElectionId) -> Result<ElectionDetails, TallyError> {
        let election = self
            .store
            .catalog
            .get(election_id)
            .ok_or_else(|| TallyError::ElectionNotFound(election_id.clone()))?;

        let details = self.store.ledger.snapshot(election_id, move |votes| {
            let results = self.count(&election.spec, votes);
            let total_votes = votes.len() as u64;

            let mut hourly_voting = (0..24)
                .map(|hour| (hour_label(hour), 0))
                .collect::<BTreeMap<_, _>>();
            for vote in votes {
                if let Some(count) = hourly_voting.get_mut(&hour_label(vote.cast_at.hour())) {
                    *count += 1;
                }
            }

            ElectionDetails {
                election: Election {
                    total_votes,
                    ..election
                },
                results,
                votes: votes.iter().map(AnonymousVote::from).collect(),
                total_votes,
                hourly_voting,
            }
        })?;
        Ok(details)
    }

    fn spec(&self, election_id: &ElectionId) -> Result<&ElectionSpec, TallyError> {
        self.store
            .catalog
            .spec(election_id)
            .ok_or_else(|| TallyError::ElectionNotFound(election_id.clone()))
    }

    /// Count `votes` per candidate. Must be called inside the election's
    /// ledger snapshot so that the catalog counter agrees with `votes`.
    fn count(&self, spec: &ElectionSpec, votes: &[Vote]) -> Vec<CandidateResult> {
        let total = self
            .store
            .catalog
            .total_votes(&spec.id)
            .unwrap_or(votes.len() as u64);

        let mut counts = HashMap::<&CandidateId, u64>::new();
        for vote in votes {
            *counts.entry(&vote.candidate_id).or_default() += 1;
        }

        spec.candidates
            .iter()
            .map(|candidate| {
                let votes = counts.get(&candidate.id).copied().unwrap_or(0);
                CandidateResult {
                    candidate_id: candidate.id.clone(),
                    votes,
                    percentage: percentage(votes, total),
                }
            })
            .collect()
    }
}

fn hour_label(hour: u32) -> String {
    format!("{hour:02}:00")
}
