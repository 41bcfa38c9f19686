use mongodb::bson::doc;
use rocket::{futures::TryStreamExt, serde::json::Json, Route};

use crate::error::{Error, Result};
use crate::model::{
    api::{
        auth::AuthToken,
        election::{ElectionDescription, ElectionDetails, ElectionSpec, ElectionSummary},
    },
    common::ElectionState,
    db::{
        candidate::Candidate,
        election::{Election, ElectionCore, NewElection},
        rejection::Rejection,
        vote::Vote,
    },
    mongodb::{Coll, Counter, Id, ELECTION_NUMBER_COUNTER},
};
use crate::tally;

pub fn routes() -> Vec<Route> {
    routes![
        create_election,
        list_elections,
        election_details,
        launch_election,
        cancel_election,
    ]
}

#[post("/elections", data = "<spec>", format = "json")]
async fn create_election(
    token: AuthToken,
    spec: Json<ElectionSpec>,
    candidates: Coll<Candidate>,
    new_elections: Coll<NewElection>,
    elections: Coll<Election>,
    counters: Coll<Counter>,
) -> Result<Json<ElectionDescription>> {
    let spec = spec.0;
    if spec.start_time >= spec.end_time {
        return Err(Error::bad_request("Start time must precede end time"));
    }
    if spec.candidates.is_empty() {
        return Err(Error::bad_request(
            "An election needs at least one candidate",
        ));
    }
    let mut deduped = spec.candidates.clone();
    deduped.sort_unstable();
    deduped.dedup();
    if deduped.len() != spec.candidates.len() {
        return Err(Error::bad_request("Duplicate candidates in election"));
    }
    for candidate_id in &spec.candidates {
        let exists = candidates.find_one(candidate_id.as_doc(), None).await?;
        if exists.is_none() {
            return Err(Error::not_found(format!("Candidate {}", candidate_id)));
        }
    }

    let number = Counter::next(&counters, ELECTION_NUMBER_COUNTER).await?;
    let election = ElectionCore::new(
        spec.election_type,
        number,
        spec.start_time,
        spec.end_time,
        spec.candidates,
        token.id,
        spec.context_note,
    );
    let new_id: Id = new_elections
        .insert_one(&election, None)
        .await?
        .inserted_id
        .as_object_id()
        .unwrap() // Valid because the ID comes directly from the DB.
        .into();

    let election = elections
        .find_one(new_id.as_doc(), None)
        .await?
        .unwrap(); // Just inserted.
    Ok(Json(election.into()))
}

#[get("/elections")]
async fn list_elections(elections: Coll<Election>) -> Result<Json<Vec<ElectionSummary>>> {
    let all: Vec<Election> = elections.find(None, None).await?.try_collect().await?;
    Ok(Json(all.iter().map(ElectionSummary::from).collect()))
}

/// The election-details view: metadata, insight map, and live standings
/// recomputed from the stored ballots on every read.
#[get("/elections/<election_id>")]
async fn election_details(
    election_id: Id,
    elections: Coll<Election>,
    votes: Coll<Vote>,
    rejections: Coll<Rejection>,
) -> Result<Json<ElectionDetails>> {
    let election = elections
        .find_one(election_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election {}", election_id)))?;

    let election_votes: Vec<Vote> = votes
        .find(doc! { "electionId": election_id }, None)
        .await?
        .try_collect()
        .await?;
    let rejection_count = if election.is_referendum() {
        rejections
            .count_documents(doc! { "electionId": election_id }, None)
            .await?
    } else {
        0
    };

    let standings = tally::tally(
        &election.candidates,
        election_votes.iter().map(|vote| vote.candidate_id),
        rejection_count,
    );

    Ok(Json(ElectionDetails {
        election: election.into(),
        standings,
    }))
}

#[post("/elections/<election_id>/launch")]
async fn launch_election(
    token: AuthToken,
    election_id: Id,
    elections: Coll<Election>,
) -> Result<()> {
    let election = elections
        .find_one(election_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election {}", election_id)))?;
    if election.created_by != token.id {
        return Err(Error::forbidden("Only the creator may launch an election"));
    }

    // Guarded transition: the filter loses the race against the lifecycle
    // sweep gracefully, since both produce the same target state.
    let filter = doc! {
        "_id": election_id,
        "state": ElectionState::Draft,
    };
    let update = doc! {
        "$set": { "state": ElectionState::Ongoing }
    };
    let result = elections.update_one(filter, update, None).await?;
    if result.modified_count != 1 && election.state != ElectionState::Ongoing {
        return Err(Error::bad_request(format!(
            "Election {} is not a draft; cannot launch",
            election_id
        )));
    }
    Ok(())
}

#[post("/elections/<election_id>/cancel")]
async fn cancel_election(
    token: AuthToken,
    election_id: Id,
    elections: Coll<Election>,
) -> Result<()> {
    let election = elections
        .find_one(election_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election {}", election_id)))?;
    if election.created_by != token.id {
        return Err(Error::forbidden("Only the creator may cancel an election"));
    }

    let filter = doc! {
        "_id": election_id,
        "$or": [{"state": ElectionState::Draft}, {"state": ElectionState::Ongoing}],
    };
    let update = doc! {
        "$set": { "state": ElectionState::Canceled }
    };
    let result = elections.update_one(filter, update, None).await?;
    if result.modified_count != 1 {
        return Err(Error::bad_request(format!(
            "Election {} is already finished; cannot cancel",
            election_id
        )));
    }
    Ok(())
}
