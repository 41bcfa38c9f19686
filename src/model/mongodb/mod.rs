mod bson;
mod collection;
mod counter;

pub use bson::{serde_string_map, Id};
pub use collection::{ensure_indexes_exist, Coll, MongoCollection};
pub use counter::{ensure_counters_exist, Counter, ELECTION_NUMBER_COUNTER, VOUCHER_COUNTER};
