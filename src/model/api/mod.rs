//! API-facing (JSON-serialisable) types.

pub mod auth;
pub mod election;
pub mod insight;
pub mod voting;
