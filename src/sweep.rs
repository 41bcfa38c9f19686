//! Periodic election lifecycle sweeps.
//!
//! One background task, spawned at liftoff, applies two set-wise bulk
//! updates on a fixed interval: drafts whose start time has arrived become
//! ongoing, and ongoing elections whose end time has passed become
//! completed. Both updates are idempotent; a tick with nothing due is a
//! no-op. The draft promotion overlaps with explicit launch by the creator;
//! both produce the same target state, so whichever runs first wins
//! harmlessly.

use chrono::Utc;
use mongodb::{
    bson::{doc, DateTime as BsonDateTime, Document},
    error::Error as DbError,
    Database,
};
use rocket::{
    fairing::{Fairing, Info, Kind},
    tokio,
    Orbit, Rocket,
};

use crate::config::Config;
use crate::model::{common::ElectionState, db::election::Election, mongodb::Coll};

/// Filter and update promoting due drafts to ongoing.
fn promote_due(now: BsonDateTime) -> (Document, Document) {
    (
        doc! {
            "state": ElectionState::Draft,
            "startTime": { "$lte": now },
        },
        doc! {
            "$set": { "state": ElectionState::Ongoing }
        },
    )
}

/// Filter and update completing ongoing elections past their end time.
fn complete_due(now: BsonDateTime) -> (Document, Document) {
    (
        doc! {
            "state": ElectionState::Ongoing,
            "endTime": { "$lte": now },
        },
        doc! {
            "$set": { "state": ElectionState::Completed }
        },
    )
}

/// Apply both sweeps once.
pub async fn run_sweeps(elections: &Coll<Election>) -> Result<(), DbError> {
    let now = BsonDateTime::from_chrono(Utc::now());

    let (filter, update) = promote_due(now);
    let promoted = elections
        .update_many(filter, update, None)
        .await?
        .modified_count;
    if promoted > 0 {
        info!("Lifecycle sweep: {promoted} election(s) started");
    }

    let (filter, update) = complete_due(now);
    let completed = elections
        .update_many(filter, update, None)
        .await?
        .modified_count;
    if completed > 0 {
        info!("Lifecycle sweep: {completed} election(s) completed");
    }

    Ok(())
}

/// A fairing that spawns the lifecycle sweep task at liftoff.
/// Depends on the database and config fairings having run at ignition.
pub struct SweepFairing;

#[rocket::async_trait]
impl Fairing for SweepFairing {
    fn info(&self) -> Info {
        Info {
            name: "Lifecycle Sweeps",
            kind: Kind::Liftoff,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        let interval = match rocket.state::<Config>() {
            Some(config) => config.sweep_interval(),
            None => {
                error!("Config was not available when starting lifecycle sweeps");
                return;
            }
        };
        let db = match rocket.state::<Database>() {
            Some(db) => db.clone(),
            None => {
                error!("Database was not available when starting lifecycle sweeps");
                return;
            }
        };

        info!(
            "Starting lifecycle sweeps every {} seconds",
            interval.as_secs()
        );
        tokio::spawn(async move {
            let elections = Coll::<Election>::from_db(&db);
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(e) = run_sweeps(&elections).await {
                    // Nothing is lost; the next tick retries the same work.
                    error!("Lifecycle sweep failed: {e}");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotion_targets_due_drafts() {
        let now = BsonDateTime::from_chrono(Utc::now());
        let (filter, update) = promote_due(now);
        assert_eq!(filter.get_str("state").unwrap(), "Draft");
        assert!(filter
            .get_document("startTime")
            .unwrap()
            .contains_key("$lte"));
        assert_eq!(
            update.get_document("$set").unwrap().get_str("state").unwrap(),
            "Ongoing"
        );
    }

    #[test]
    fn completion_targets_expired_ongoing() {
        let now = BsonDateTime::from_chrono(Utc::now());
        let (filter, update) = complete_due(now);
        assert_eq!(filter.get_str("state").unwrap(), "Ongoing");
        assert!(filter.get_document("endTime").unwrap().contains_key("$lte"));
        assert_eq!(
            update.get_document("$set").unwrap().get_str("state").unwrap(),
            "Completed"
        );
    }
}
