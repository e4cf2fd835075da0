//! API-compatible types.
//!
//! The types in this module are what goes over the wire, e.g.:
//!
//! - Field names are camelCase.
//! - Datetimes are serialised as RFC 3339 strings.
//!
//! Request guards that pull credentials and provenance out of a request
//! live here too.

pub mod auth;
pub mod vote;
