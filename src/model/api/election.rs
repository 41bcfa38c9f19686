use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::insight::section::SectionEntry;
use crate::model::{
    common::{ElectionState, ElectionType},
    db::election::Election,
    mongodb::Id,
};
use crate::tally::CandidateTally;

/// A new election, as submitted by its creator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionSpec {
    pub election_type: ElectionType,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub candidates: Vec<Id>,
    #[serde(default)]
    pub context_note: String,
}

/// Election list entry.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionSummary {
    pub id: Id,
    pub election_type: ElectionType,
    pub number: u64,
    pub state: ElectionState,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl From<&Election> for ElectionSummary {
    fn from(election: &Election) -> Self {
        Self {
            id: election.id,
            election_type: election.election_type,
            number: election.number,
            state: election.state,
            start_time: election.start_time,
            end_time: election.end_time,
        }
    }
}

/// Full election details, including the insight map in its external shape:
/// candidate ID -> section title -> entry.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionDescription {
    pub id: Id,
    pub election_type: ElectionType,
    pub number: u64,
    pub state: ElectionState,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub candidates: Vec<Id>,
    pub created_by: Id,
    pub context_note: String,
    pub insights: HashMap<String, HashMap<String, SectionEntry>>,
}

impl From<Election> for ElectionDescription {
    fn from(election: Election) -> Self {
        let insights = election
            .insights
            .iter()
            .map(|(candidate_id, sections)| {
                let titled = sections
                    .iter()
                    .map(|(kind, entry)| (kind.title().to_string(), entry.clone()))
                    .collect();
                (candidate_id.to_string(), titled)
            })
            .collect();
        Self {
            id: election.id,
            election_type: election.election_type,
            number: election.number,
            state: election.state,
            start_time: election.start_time,
            end_time: election.end_time,
            candidates: election.election.candidates,
            created_by: election.election.created_by,
            context_note: election.election.context_note,
            insights,
        }
    }
}

/// The election-details view: description plus live standings.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionDetails {
    #[serde(flatten)]
    pub election: ElectionDescription,
    pub standings: Vec<CandidateTally>,
}
