use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// The demographic field family shared by votes and rejections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Demographics {
    pub age: u32,
    pub gender: String,
    pub education: String,
    pub employment: String,
    pub marital_status: String,
    pub religion: String,
    pub dwelling_type: String,
    pub province: String,
    pub district: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_rent: Option<u32>,
    pub sector: String,
}

/// Core vote data, as stored in the database.
///
/// A vote is written once by the casting operation and never mutated or
/// deleted afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteCore {
    pub election_id: Id,
    pub candidate_id: Id,
    /// One-time anonymisation token; unique across votes and rejections.
    pub voucher: u64,
    #[serde(flatten)]
    pub demographics: Demographics,
    pub opinion_of_candidate: String,
    pub expectations: String,
    /// 1-10 self-reported likelihood of actually turning out to vote.
    pub relative_vote_likelihood: u8,
    pub reasons: String,
    pub party_support: String,
    pub policy_familiarity: bool,
    pub policy_understanding: String,
}

/// A vote without an ID, ready for insertion.
pub type NewVote = VoteCore;

/// A vote from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub vote: VoteCore,
}

impl Deref for Vote {
    type Target = VoteCore;

    fn deref(&self) -> &Self::Target {
        &self.vote
    }
}

#[cfg(test)]
pub(crate) mod examples {
    use super::*;

    impl Demographics {
        pub fn example() -> Self {
            Self {
                age: 34,
                gender: "female".to_string(),
                education: "bachelor".to_string(),
                employment: "employed".to_string(),
                marital_status: "married".to_string(),
                religion: "none".to_string(),
                dwelling_type: "apartment".to_string(),
                province: "Western".to_string(),
                district: "Colombo".to_string(),
                monthly_rent: Some(45_000),
                sector: "private".to_string(),
            }
        }
    }

    impl VoteCore {
        pub fn example(election_id: Id, candidate_id: Id, voucher: u64) -> Self {
            Self {
                election_id,
                candidate_id,
                voucher,
                demographics: Demographics::example(),
                opinion_of_candidate: "Capable but untested.".to_string(),
                expectations: "Lower cost of living.".to_string(),
                relative_vote_likelihood: 8,
                reasons: "Strong economic platform.".to_string(),
                party_support: "Independent".to_string(),
                policy_familiarity: true,
                policy_understanding: "Understands the housing policy well.".to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialises_with_camel_case_fields() {
        let vote = VoteCore::example(Id::new(), Id::new(), 1);
        let value = serde_json::to_value(&vote).unwrap();
        assert!(value.get("maritalStatus").is_some());
        assert!(value.get("relativeVoteLikelihood").is_some());
        assert!(value.get("policyFamiliarity").is_some());
        // Demographics are flattened into the top-level document.
        assert!(value.get("demographics").is_none());
    }
}
