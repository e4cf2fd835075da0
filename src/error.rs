use std::fmt::Display;

use rocket::{http::Status, response::Responder, serde::json::Json};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::common::{CandidateId, ElectionId, VoteId};

pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the underlying stores. All of these are retryable from the
/// caller's point of view, and none of them leave partial state behind.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("vote ID {0} already exists in the ledger")]
    DuplicateId(VoteId),
    #[error("no ledger partition for election {0}")]
    MissingPartition(ElectionId),
    #[error("{0} lock poisoned")]
    Poisoned(&'static str),
}

/// Failures while signing in or registering.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown identity or wrong password; deliberately indistinguishable.
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("identity has not been verified")]
    Unverified,
    #[error("an identity with this national ID or email is already registered")]
    AlreadyRegistered,
    #[error("failed to hash credentials: {0}")]
    Hashing(#[from] argon2::Error),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Every outcome of a failed `cast_vote`.
#[derive(Debug, Error)]
pub enum VoteError {
    /// Absent, expired and malformed tokens all collapse to this.
    #[error("invalid session")]
    InvalidSession,
    #[error("election {0} not found")]
    ElectionNotFound(ElectionId),
    #[error("election {0} is not open for voting")]
    ElectionNotOpen(ElectionId),
    #[error("already voted in this election")]
    AlreadyVoted,
    #[error("candidate {0} is not standing in this election")]
    InvalidCandidate(CandidateId),
    #[error("storage failure: {0}")]
    StorageFailure(#[from] StoreError),
}

/// Failures of read-only tally and reporting queries.
#[derive(Debug, Error)]
pub enum TallyError {
    #[error("election {0} not found")]
    ElectionNotFound(ElectionId),
    #[error("storage failure: {0}")]
    StorageFailure(#[from] StoreError),
}

/// Top-level API error, convertible into an HTTP response.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Vote(#[from] VoteError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Tally(#[from] TallyError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{1}")]
    Status(Status, String),
}

impl Error {
    pub fn not_found(what: impl Display) -> Self {
        Self::Status(Status::NotFound, format!("Not found: {what}"))
    }

    pub fn unauthorized(why: impl Display) -> Self {
        Self::Status(Status::Unauthorized, format!("Unauthorized: {why}"))
    }

    /// Stable machine-readable code, so callers can tell outcomes apart.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Vote(err) => match err {
                VoteError::InvalidSession => "invalid_session",
                VoteError::ElectionNotFound(_) => "election_not_found",
                VoteError::ElectionNotOpen(_) => "election_not_open",
                VoteError::AlreadyVoted => "already_voted",
                VoteError::InvalidCandidate(_) => "invalid_candidate",
                VoteError::StorageFailure(_) => "storage_failure",
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "invalid_credentials",
                AuthError::Unverified => "unverified",
                AuthError::AlreadyRegistered => "already_registered",
                AuthError::Hashing(_) => "internal_error",
                AuthError::Storage(_) => "storage_failure",
            },
            Self::Tally(err) => match err {
                TallyError::ElectionNotFound(_) => "election_not_found",
                TallyError::StorageFailure(_) => "storage_failure",
            },
            Self::Store(_) => "storage_failure",
            Self::Status(status, _) => match status.code {
                401 => "invalid_session",
                403 => "forbidden",
                404 => "not_found",
                _ => "error",
            },
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Self::Vote(err) => match err {
                VoteError::InvalidSession => Status::Unauthorized,
                VoteError::ElectionNotFound(_) => Status::NotFound,
                VoteError::ElectionNotOpen(_) => Status::Forbidden,
                VoteError::AlreadyVoted => Status::Conflict,
                VoteError::InvalidCandidate(_) => Status::UnprocessableEntity,
                VoteError::StorageFailure(_) => Status::ServiceUnavailable,
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => Status::Unauthorized,
                AuthError::Unverified => Status::Forbidden,
                AuthError::AlreadyRegistered => Status::Conflict,
                AuthError::Hashing(_) => Status::InternalServerError,
                AuthError::Storage(_) => Status::ServiceUnavailable,
            },
            Self::Tally(err) => match err {
                TallyError::ElectionNotFound(_) => Status::NotFound,
                TallyError::StorageFailure(_) => Status::ServiceUnavailable,
            },
            Self::Store(_) => Status::ServiceUnavailable,
            Self::Status(status, _) => *status,
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        if status.code >= 500 {
            error!("Request failed: {self}");
        } else {
            debug!("Request rejected: {self}");
        }
        let body = ErrorBody {
            error: self.code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).respond_to(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_errors_have_distinct_codes() {
        let errors: Vec<Error> = vec![
            VoteError::InvalidSession.into(),
            VoteError::ElectionNotFound(ElectionId::from("E")).into(),
            VoteError::ElectionNotOpen(ElectionId::from("E")).into(),
            VoteError::AlreadyVoted.into(),
            VoteError::InvalidCandidate(CandidateId::from("C")).into(),
            VoteError::StorageFailure(StoreError::Poisoned("ledger")).into(),
        ];
        let codes = errors.iter().map(Error::code).collect::<Vec<_>>();
        let mut deduped = codes.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(codes.len(), deduped.len());
    }

    #[test]
    fn storage_failures_are_retryable_statuses() {
        let err: Error = VoteError::from(StoreError::DuplicateId(VoteId::from("vote_1"))).into();
        assert_eq!(err.status(), Status::ServiceUnavailable);
        assert_eq!(err.code(), "storage_failure");
    }
}
