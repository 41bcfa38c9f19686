//! DB-compatible (e.g. de/serialisable) types.

pub mod candidate;
pub mod election;
pub mod rejection;
pub mod vote;
pub mod voucher;
