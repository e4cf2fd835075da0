//! Domain types, plus the API types built on them.

pub mod api;
pub mod common;
pub mod election;
pub mod identity;
pub mod session;
pub mod tally;
pub mod vote;
