use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    db::vote::{Demographics, VoteCore},
    db::rejection::RejectionCore,
    mongodb::Id,
};

/// A vote as submitted by a respondent. The election is named in the URL and
/// the voucher is issued server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteSubmission {
    pub candidate_id: Id,
    #[serde(flatten)]
    pub demographics: Demographics,
    pub opinion_of_candidate: String,
    pub expectations: String,
    pub relative_vote_likelihood: u8,
    pub reasons: String,
    pub party_support: String,
    pub policy_familiarity: bool,
    pub policy_understanding: String,
}

impl VoteSubmission {
    /// Validate field constraints, then attach the election and voucher.
    pub fn into_vote(self, election_id: Id, voucher: u64) -> Result<VoteCore> {
        validate_demographics(&self.demographics)?;
        if !(1..=10).contains(&self.relative_vote_likelihood) {
            return Err(Error::bad_request(
                "relativeVoteLikelihood must be between 1 and 10",
            ));
        }
        Ok(VoteCore {
            election_id,
            candidate_id: self.candidate_id,
            voucher,
            demographics: self.demographics,
            opinion_of_candidate: self.opinion_of_candidate,
            expectations: self.expectations,
            relative_vote_likelihood: self.relative_vote_likelihood,
            reasons: self.reasons,
            party_support: self.party_support,
            policy_familiarity: self.policy_familiarity,
            policy_understanding: self.policy_understanding,
        })
    }
}

/// A rejection as submitted by a respondent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionSubmission {
    #[serde(flatten)]
    pub demographics: Demographics,
    pub reason: String,
    pub relative_vote_likelihood: bool,
}

impl RejectionSubmission {
    pub fn into_rejection(self, election_id: Id, voucher: u64) -> Result<RejectionCore> {
        validate_demographics(&self.demographics)?;
        if self.reason.trim().is_empty() {
            return Err(Error::bad_request("A rejection requires a reason"));
        }
        Ok(RejectionCore {
            election_id,
            voucher,
            demographics: self.demographics,
            reason: self.reason,
            relative_vote_likelihood: self.relative_vote_likelihood,
        })
    }
}

fn validate_demographics(demographics: &Demographics) -> Result<()> {
    if !(18..=120).contains(&demographics.age) {
        return Err(Error::bad_request("age must be between 18 and 120"));
    }
    Ok(())
}

/// Returned to the respondent after a successful cast.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BallotReceipt {
    pub voucher: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> VoteSubmission {
        VoteSubmission {
            candidate_id: Id::new(),
            demographics: Demographics::example(),
            opinion_of_candidate: String::new(),
            expectations: String::new(),
            relative_vote_likelihood: 5,
            reasons: String::new(),
            party_support: String::new(),
            policy_familiarity: false,
            policy_understanding: String::new(),
        }
    }

    #[test]
    fn accepts_valid_submission() {
        let vote = submission().into_vote(Id::new(), 42).unwrap();
        assert_eq!(vote.voucher, 42);
    }

    #[test]
    fn rejects_out_of_range_likelihood() {
        let mut sub = submission();
        sub.relative_vote_likelihood = 0;
        assert!(sub.clone().into_vote(Id::new(), 1).is_err());
        sub.relative_vote_likelihood = 11;
        assert!(sub.into_vote(Id::new(), 1).is_err());
    }

    #[test]
    fn rejects_out_of_range_age() {
        let mut sub = submission();
        sub.demographics.age = 17;
        assert!(sub.into_vote(Id::new(), 1).is_err());
    }

    #[test]
    fn rejection_requires_reason() {
        let rejection = RejectionSubmission {
            demographics: Demographics::example(),
            reason: "  ".to_string(),
            relative_vote_likelihood: true,
        };
        assert!(rejection.into_rejection(Id::new(), 1).is_err());
    }
}
