use chrono::Utc;

use crate::error::{StoreError, VoteError};
use crate::model::{
    common::{CandidateId, ElectionId, Role, VoteId},
    election::Election,
    session::Session,
    vote::{Provenance, Vote, VoteReceipt},
};

use super::Engine;

impl Engine {
    /// Cast one vote on behalf of the session behind `token`.
    ///
    /// Of any number of concurrent calls for the same voter and election,
    /// exactly one succeeds and the rest fail with [`VoteError::AlreadyVoted`].
    /// A failed call leaves the ledger, the index and the counter untouched.
    pub fn cast_vote(
        &self,
        token: &str,
        election_id: &ElectionId,
        candidate_id: &CandidateId,
        provenance: Provenance,
    ) -> Result<VoteReceipt, VoteError> {
        self.cast_vote_with_id(
            token,
            election_id,
            candidate_id,
            provenance,
            VoteId::generate(),
        )
    }

    pub(crate) fn cast_vote_with_id(
        &self,
        token: &str,
        election_id: &ElectionId,
        candidate_id: &CandidateId,
        provenance: Provenance,
        vote_id: VoteId,
    ) -> Result<VoteReceipt, VoteError> {
        let session = self.voter_session(token)?;

        let election = self
            .store
            .catalog
            .get(election_id)
            .ok_or_else(|| VoteError::ElectionNotFound(election_id.clone()))?;
        if !election.accepts_votes() {
            return Err(VoteError::ElectionNotOpen(election_id.clone()));
        }

        // Held until the end of the commit: nobody else can vote for this
        // (voter, election) pair in the meantime.
        let claim = self.store.index.claim(&session.identity_id, election_id)?;
        if claim.has_voted() {
            warn!(
                "Rejected repeat vote by {} in {election_id}",
                session.identity_id
            );
            return Err(VoteError::AlreadyVoted);
        }

        if election.candidate(candidate_id).is_none() {
            return Err(VoteError::InvalidCandidate(candidate_id.clone()));
        }

        // The session may have expired or been revoked while we waited for the claim.
        let cast_at = Utc::now();
        if self.store.sessions.validate_at(token, cast_at)?.is_none() {
            return Err(VoteError::InvalidSession);
        }

        let vote = Vote {
            id: vote_id.clone(),
            election_id: election_id.clone(),
            voter_id: session.identity_id,
            candidate_id: candidate_id.clone(),
            cast_at,
            provenance,
        };
        self.store.ledger.append_with(vote, || {
            self.store
                .catalog
                .increment_total(election_id)
                .map(|_| ())
                .ok_or_else(|| StoreError::MissingPartition(election_id.clone()))
        })?;
        claim.mark_voted();

        info!("Recorded vote {vote_id} in {election_id}");
        Ok(VoteReceipt {
            vote_id,
            election_id: election_id.clone(),
            cast_at,
        })
    }

    /// Has the voter behind `token` already voted in this election?
    pub fn has_voted(&self, token: &str, election_id: &ElectionId) -> Result<bool, VoteError> {
        let session = self.voter_session(token)?;
        if self.store.catalog.spec(election_id).is_none() {
            return Err(VoteError::ElectionNotFound(election_id.clone()));
        }
        Ok(self.store.index.has_voted(&session.identity_id, election_id)?)
    }

    /// Every election the voter behind `token` has voted in.
    pub fn voted_elections(&self, token: &str) -> Result<Vec<ElectionId>, VoteError> {
        let session = self.voter_session(token)?;
        Ok(self.store.index.voted_elections(&session.identity_id)?)
    }

    /// Elections currently open for voting, in catalog order.
    pub fn active_elections(&self) -> Vec<Election> {
        self.store.catalog.list_active()
    }

    /// Only voter sessions can vote; any other role is treated like no session at all.
    fn voter_session(&self, token: &str) -> Result<Session, VoteError> {
        let session = self.session(token)?;
        if session.role != Role::Voter {
            debug!("{} session {} tried to act as a voter", session.role, session.identity_id);
            return Err(VoteError::InvalidSession);
        }
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Duration;

    use super::*;
    use crate::engine::fixtures::{engine, sign_in};
    use crate::model::{common::ElectionStatus, election::ElectionSpec};
    use crate::store::{seed::DEMO_ADMIN, Store};

    fn e1() -> ElectionId {
        ElectionId::from("E1")
    }

    fn vote_for(engine: &Engine, token: &str, candidate: &str) -> Result<VoteReceipt, VoteError> {
        engine.cast_vote(
            token,
            &e1(),
            &CandidateId::from(candidate),
            Provenance::example(),
        )
    }

    fn assert_counter_matches_ledger(engine: &Engine, election_id: &ElectionId) {
        let store = engine.store();
        let consistent = store
            .ledger
            .snapshot(election_id, |votes| {
                store.catalog.total_votes(election_id) == Some(votes.len() as u64)
            })
            .unwrap();
        assert!(consistent);
    }

    #[test]
    fn single_vote_then_already_voted() {
        let engine = engine(Duration::hours(24));
        let token = sign_in(&engine, "1", "Nairobi");

        assert!(!engine.has_voted(&token, &e1()).unwrap());
        let receipt = vote_for(&engine, &token, "A").unwrap();
        assert_eq!(receipt.election_id, e1());
        assert!(receipt.vote_id.starts_with("vote_"));
        assert!(engine.has_voted(&token, &e1()).unwrap());

        let results = engine.results_for(&e1()).unwrap();
        assert_eq!(results[0].votes, 1);
        assert_eq!(results[0].percentage, 100.0);
        assert_eq!(results[1].votes, 0);
        assert_eq!(results[1].percentage, 0.0);

        assert!(matches!(
            vote_for(&engine, &token, "B"),
            Err(VoteError::AlreadyVoted)
        ));
        assert_eq!(engine.results_for(&e1()).unwrap(), results);
        assert_eq!(engine.voted_elections(&token).unwrap(), vec![e1()]);
    }

    #[test]
    fn racing_casts_for_one_pair_record_one_vote() {
        let engine = engine(Duration::hours(24));
        let token = sign_in(&engine, "1", "Nairobi");
        let succeeded = AtomicUsize::new(0);
        let already_voted = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for _ in 0..100 {
                s.spawn(|| match vote_for(&engine, &token, "A") {
                    Ok(_) => {
                        succeeded.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(VoteError::AlreadyVoted) => {
                        already_voted.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(err) => panic!("unexpected error: {err}"),
                });
            }
        });

        assert_eq!(succeeded.load(Ordering::SeqCst), 1);
        assert_eq!(already_voted.load(Ordering::SeqCst), 99);
        assert_eq!(engine.store().ledger.len(&e1()).unwrap(), 1);
        assert_eq!(engine.results_for(&e1()).unwrap()[0].votes, 1);
        assert!(engine.has_voted(&token, &e1()).unwrap());
    }

    #[test]
    fn counter_tracks_ledger_under_concurrent_voters() {
        let engine = engine(Duration::hours(24));
        let tokens = (0..16)
            .map(|i| sign_in(&engine, &i.to_string(), "Nairobi"))
            .collect::<Vec<_>>();

        std::thread::scope(|s| {
            for (i, token) in tokens.iter().enumerate() {
                let engine = &engine;
                s.spawn(move || {
                    let candidate = if i % 2 == 0 { "A" } else { "B" };
                    vote_for(engine, token, candidate).unwrap();
                });
            }
            s.spawn(|| {
                for _ in 0..200 {
                    assert_counter_matches_ledger(&engine, &e1());
                }
            });
        });

        assert_eq!(engine.election(&e1()).unwrap().total_votes, 16);
        assert_counter_matches_ledger(&engine, &e1());
    }

    #[test]
    fn invalid_candidate_mutates_nothing() {
        let engine = engine(Duration::hours(24));
        let token = sign_in(&engine, "1", "Nairobi");

        assert!(matches!(
            vote_for(&engine, &token, "Z"),
            Err(VoteError::InvalidCandidate(_))
        ));
        assert_eq!(engine.store().ledger.len(&e1()).unwrap(), 0);
        assert_eq!(engine.election(&e1()).unwrap().total_votes, 0);
        assert!(!engine.has_voted(&token, &e1()).unwrap());

        // The voter can still vote properly afterwards.
        vote_for(&engine, &token, "A").unwrap();
    }

    #[test]
    fn expired_session_cannot_vote() {
        let engine = engine(Duration::zero());
        let token = sign_in(&engine, "1", "Nairobi");

        assert!(matches!(
            vote_for(&engine, &token, "A"),
            Err(VoteError::InvalidSession)
        ));
        assert!(matches!(
            engine.has_voted(&token, &e1()),
            Err(VoteError::InvalidSession)
        ));
        assert_eq!(engine.store().ledger.len(&e1()).unwrap(), 0);
    }

    #[test]
    fn unknown_and_closed_elections() {
        let engine = engine(Duration::hours(24));
        let token = sign_in(&engine, "1", "Nairobi");

        assert!(matches!(
            engine.cast_vote(
                &token,
                &ElectionId::from("E9"),
                &CandidateId::from("A"),
                Provenance::example()
            ),
            Err(VoteError::ElectionNotFound(_))
        ));
        assert!(matches!(
            engine.cast_vote(
                &token,
                &ElectionId::from("E2"),
                &CandidateId::from("C"),
                Provenance::example()
            ),
            Err(VoteError::ElectionNotOpen(_))
        ));

        engine.store().catalog.close(&e1());
        assert_eq!(engine.store().catalog.status(&e1()), Some(ElectionStatus::Completed));
        assert!(matches!(
            vote_for(&engine, &token, "A"),
            Err(VoteError::ElectionNotOpen(_))
        ));
    }

    #[test]
    fn opened_ahead_of_schedule_accepts_votes() {
        let mut spec = ElectionSpec::example("E3", &["A"]);
        spec.start_at = Utc::now() + Duration::days(1);
        spec.end_at = spec.start_at + Duration::days(1);
        let engine = Engine::new(Store::new(
            vec![(spec, ElectionStatus::Upcoming)],
            Duration::hours(24),
        ));
        let token = sign_in(&engine, "1", "Nairobi");
        let e3 = ElectionId::from("E3");
        let cast = || engine.cast_vote(&token, &e3, &CandidateId::from("A"), Provenance::example());

        assert!(matches!(cast(), Err(VoteError::ElectionNotOpen(_))));

        assert_eq!(engine.store().catalog.open(&e3), Some(ElectionStatus::Active));
        cast().unwrap();
        assert_eq!(engine.election(&e3).unwrap().total_votes, 1);
        assert_counter_matches_ledger(&engine, &e3);
    }

    #[test]
    fn session_revoked_while_waiting_for_claim() {
        let engine = engine(Duration::hours(24));
        let token = sign_in(&engine, "1", "Nairobi");
        let voter_id = engine.session(&token).unwrap().identity_id;

        // Holding the pair's claim parks the cast after its first session check.
        let claim = engine.store().index.claim(&voter_id, &e1()).unwrap();
        std::thread::scope(|s| {
            let cast = s.spawn(|| vote_for(&engine, &token, "A"));
            std::thread::sleep(std::time::Duration::from_millis(200));
            engine.logout(&token).unwrap();
            drop(claim);

            assert!(matches!(cast.join().unwrap(), Err(VoteError::InvalidSession)));
        });

        assert_eq!(engine.store().ledger.len(&e1()).unwrap(), 0);
        assert_eq!(engine.election(&e1()).unwrap().total_votes, 0);
        assert!(!engine.store().index.has_voted(&voter_id, &e1()).unwrap());
    }

    #[test]
    fn non_voter_sessions_cannot_vote() {
        let engine = Engine::new(Store::example());
        let admin = engine
            .authenticate(DEMO_ADMIN.national_id, DEMO_ADMIN.password)
            .unwrap();
        let presidential = ElectionId::from("election_2027_presidential");

        assert!(matches!(
            engine.cast_vote(
                admin.token.as_str(),
                &presidential,
                &CandidateId::from("candidate_1"),
                Provenance::example()
            ),
            Err(VoteError::InvalidSession)
        ));
    }

    #[test]
    fn failed_commit_rolls_back() {
        let engine = engine(Duration::hours(24));
        let first = sign_in(&engine, "1", "Nairobi");
        let second = sign_in(&engine, "2", "Nairobi");
        let vote_id = VoteId::from("vote_fixed");

        engine
            .cast_vote_with_id(
                &first,
                &e1(),
                &CandidateId::from("A"),
                Provenance::example(),
                vote_id.clone(),
            )
            .unwrap();
        let collision = engine.cast_vote_with_id(
            &second,
            &e1(),
            &CandidateId::from("B"),
            Provenance::example(),
            vote_id,
        );

        assert!(matches!(
            collision,
            Err(VoteError::StorageFailure(StoreError::DuplicateId(_)))
        ));
        assert!(!engine.has_voted(&second, &e1()).unwrap());
        assert_eq!(engine.election(&e1()).unwrap().total_votes, 1);
        assert_counter_matches_ledger(&engine, &e1());

        // A retry with a fresh ID goes through.
        vote_for(&engine, &second, "B").unwrap();
        assert_eq!(engine.election(&e1()).unwrap().total_votes, 2);
    }

    #[test]
    fn active_elections_in_catalog_order() {
        let engine = engine(Duration::hours(24));
        let active = engine
            .active_elections()
            .into_iter()
            .map(|e| e.spec.id)
            .collect::<Vec<_>>();
        assert_eq!(active, vec![e1()]);
    }
}
