use rocket::{serde::json::Json, Route};

use crate::error::{Error, Result};
use crate::model::{
    api::voting::{BallotReceipt, RejectionSubmission, VoteSubmission},
    common::ElectionState,
    db::{
        election::Election,
        rejection::NewRejection,
        vote::NewVote,
        voucher::Voucher,
    },
    mongodb::{Coll, Counter, Id},
};

pub fn routes() -> Vec<Route> {
    routes![cast_vote, cast_rejection]
}

/// Look up an election that is currently accepting ballots.
async fn ongoing_election(election_id: Id, elections: &Coll<Election>) -> Result<Election> {
    let election = elections
        .find_one(election_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election {}", election_id)))?;
    if election.state != ElectionState::Ongoing {
        return Err(Error::bad_request(format!(
            "Election {} is not accepting ballots",
            election_id
        )));
    }
    Ok(election)
}

#[post("/elections/<election_id>/votes", data = "<submission>", format = "json")]
async fn cast_vote(
    election_id: Id,
    submission: Json<VoteSubmission>,
    elections: Coll<Election>,
    votes: Coll<NewVote>,
    vouchers: Coll<Voucher>,
    counters: Coll<Counter>,
) -> Result<Json<BallotReceipt>> {
    let election = ongoing_election(election_id, &elections).await?;
    if !election.is_participant(submission.candidate_id) {
        return Err(Error::not_found(format!(
            "Candidate {} in election {}",
            submission.candidate_id, election_id
        )));
    }

    // Issue the one-time voucher, then store the immutable ballot.
    let voucher = Voucher::issue(&vouchers, &counters, election_id).await?;
    let vote = submission.0.into_vote(election_id, voucher.number)?;
    votes.insert_one(vote, None).await?;

    Ok(Json(BallotReceipt {
        voucher: voucher.number,
    }))
}

#[post(
    "/elections/<election_id>/rejections",
    data = "<submission>",
    format = "json"
)]
async fn cast_rejection(
    election_id: Id,
    submission: Json<RejectionSubmission>,
    elections: Coll<Election>,
    rejections: Coll<NewRejection>,
    vouchers: Coll<Voucher>,
    counters: Coll<Counter>,
) -> Result<Json<BallotReceipt>> {
    let election = ongoing_election(election_id, &elections).await?;
    // Rejections are only meaningful as the "no" side of a referendum.
    if !election.is_referendum() {
        return Err(Error::bad_request(
            "Rejections only apply to single-candidate elections",
        ));
    }

    let voucher = Voucher::issue(&vouchers, &counters, election_id).await?;
    let rejection = submission.0.into_rejection(election_id, voucher.number)?;
    rejections.insert_one(rejection, None).await?;

    Ok(Json(BallotReceipt {
        voucher: voucher.number,
    }))
}
