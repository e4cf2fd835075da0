//! Types shared between the stores, the engine and the API.

mod ids;
mod role;
mod status;

pub use ids::{CandidateId, ElectionId, IdentityId, SessionToken, VoteId};
pub use role::{Admin, Observer, Role, RoleMarker, Voter};
pub use status::ElectionStatus;
