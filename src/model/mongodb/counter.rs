use mongodb::{
    bson::doc,
    error::Error as DbError,
    options::{FindOneAndUpdateOptions, ReturnDocument},
};
use rocket::http::Status;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::mongodb::Coll;

/// Counter for sequential election display numbers.
pub const ELECTION_NUMBER_COUNTER: &str = "election_number";
/// Counter for globally unique, monotonically increasing voucher numbers.
pub const VOUCHER_COUNTER: &str = "voucher";

/// A named counter object used to implement auto-increment fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counter {
    #[serde(rename = "_id")]
    pub name: String,
    pub next: u64,
}

impl Counter {
    /// Create a new `Counter` starting at the given value.
    pub fn new(name: impl Into<String>, start: u64) -> Self {
        Self {
            name: name.into(),
            next: start,
        }
    }

    /// Atomically retrieve the next value of the counter with the given name.
    pub async fn next(counters: &Coll<Counter>, name: &str) -> Result<u64> {
        let update = doc! {
            "$inc": { "next": 1 }
        };
        let options: FindOneAndUpdateOptions = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::Before)
            .build();
        let counter = counters
            .find_one_and_update(doc! { "_id": name }, update, options)
            .await?
            .ok_or_else(|| {
                Error::Status(
                    Status::InternalServerError,
                    format!("Failed to find counter '{}'", name),
                )
            })?;
        Ok(counter.next)
    }
}

/// Ensure the global counters exist, without resetting any that do.
///
/// This operation is idempotent.
pub async fn ensure_counters_exist(counters: &Coll<Counter>) -> std::result::Result<(), DbError> {
    for name in [ELECTION_NUMBER_COUNTER, VOUCHER_COUNTER] {
        let existing = counters.find_one(doc! { "_id": name }, None).await?;
        if existing.is_none() {
            debug!("Creating counter '{name}'");
            counters.insert_one(Counter::new(name, 1), None).await?;
        }
    }
    Ok(())
}
