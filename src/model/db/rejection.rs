use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

use super::vote::Demographics;

/// Core rejection data, as stored in the database.
///
/// A rejection is a "no" ballot, valid only in single-candidate
/// (referendum-style) elections, so it carries no candidate reference.
/// Like a vote, it is written once and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionCore {
    pub election_id: Id,
    /// One-time anonymisation token; unique across votes and rejections.
    pub voucher: u64,
    #[serde(flatten)]
    pub demographics: Demographics,
    /// Why the respondent rejects the candidate. Required.
    pub reason: String,
    /// Whether the respondent expects to turn out at all. Boolean here,
    /// unlike the vote's 1-10 scale; the two are deliberately kept distinct.
    pub relative_vote_likelihood: bool,
}

/// A rejection without an ID, ready for insertion.
pub type NewRejection = RejectionCore;

/// A rejection from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub rejection: RejectionCore,
}

impl Deref for Rejection {
    type Target = RejectionCore;

    fn deref(&self) -> &Self::Target {
        &self.rejection
    }
}

#[cfg(test)]
pub(crate) mod examples {
    use super::*;

    impl RejectionCore {
        pub fn example(election_id: Id, voucher: u64) -> Self {
            Self {
                election_id,
                voucher,
                demographics: Demographics::example(),
                reason: "Opposed to the proposed land reform.".to_string(),
                relative_vote_likelihood: true,
            }
        }
    }
}
