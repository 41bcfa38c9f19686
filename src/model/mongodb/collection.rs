use std::ops::Deref;

use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};
use rocket::{
    request::{self, FromRequest, Request},
    State,
};

use crate::model::db::{
    candidate::{Candidate, NewCandidate},
    election::{Election, NewElection},
    rejection::{NewRejection, Rejection},
    vote::{NewVote, Vote},
    voucher::Voucher,
};

use super::counter::Counter;

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r, T> FromRequest<'r> for Coll<T>
where
    T: MongoCollection,
{
    type Error = ();

    /// Get the database connection from the managed state and wrap it in a collection.
    ///
    /// Panics iff the [`Database`] is not managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let db = req.guard::<&State<Database>>().await.unwrap();
        request::Outcome::Success(Coll::from_db(db))
    }
}

// Candidate collections
const CANDIDATES: &str = "candidates";
impl MongoCollection for Candidate {
    const NAME: &'static str = CANDIDATES;
}
impl MongoCollection for NewCandidate {
    const NAME: &'static str = CANDIDATES;
}

// Election collections
const ELECTIONS: &str = "elections";
impl MongoCollection for Election {
    const NAME: &'static str = ELECTIONS;
}
impl MongoCollection for NewElection {
    const NAME: &'static str = ELECTIONS;
}

// Vote collections
const VOTES: &str = "votes";
impl MongoCollection for Vote {
    const NAME: &'static str = VOTES;
}
impl MongoCollection for NewVote {
    const NAME: &'static str = VOTES;
}

// Rejection collections
const REJECTIONS: &str = "rejections";
impl MongoCollection for Rejection {
    const NAME: &'static str = REJECTIONS;
}
impl MongoCollection for NewRejection {
    const NAME: &'static str = REJECTIONS;
}

// Voucher collection
const VOUCHERS: &str = "vouchers";
impl MongoCollection for Voucher {
    const NAME: &'static str = VOUCHERS;
}

// Counter collection
const COUNTERS: &str = "counters";
impl MongoCollection for Counter {
    const NAME: &'static str = COUNTERS;
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    let unique = IndexOptions::builder().unique(true).build();

    // Candidate collection: unique email.
    let candidate_index = IndexModel::builder()
        .keys(doc! {"email": 1})
        .options(unique.clone())
        .build();
    Coll::<Candidate>::from_db(db)
        .create_index(candidate_index, None)
        .await?;

    // Voucher collection: a voucher number is issued at most once.
    let voucher_index = IndexModel::builder()
        .keys(doc! {"number": 1})
        .options(unique.clone())
        .build();
    Coll::<Voucher>::from_db(db)
        .create_index(voucher_index, None)
        .await?;

    // Vote and rejection collections: a voucher backs at most one ballot.
    let vote_index = IndexModel::builder()
        .keys(doc! {"voucher": 1})
        .options(unique.clone())
        .build();
    Coll::<Vote>::from_db(db)
        .create_index(vote_index, None)
        .await?;
    let rejection_index = IndexModel::builder()
        .keys(doc! {"voucher": 1})
        .options(unique)
        .build();
    Coll::<Rejection>::from_db(db)
        .create_index(rejection_index, None)
        .await?;

    // Non-unique lookup indexes for the tally and extraction read paths.
    let vote_lookup = IndexModel::builder()
        .keys(doc! {"electionId": 1, "candidateId": 1})
        .build();
    Coll::<Vote>::from_db(db)
        .create_index(vote_lookup, None)
        .await?;
    let rejection_lookup = IndexModel::builder().keys(doc! {"electionId": 1}).build();
    Coll::<Rejection>::from_db(db)
        .create_index(rejection_lookup, None)
        .await?;

    Ok(())
}
