use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::{doc, serde_helpers::chrono_datetime_as_bson_datetime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::insight::section::{SectionEntry, SectionKind};
use crate::model::{
    common::{ElectionState, ElectionType},
    mongodb::{serde_string_map, Coll, Id},
};

/// Insight sections generated for one candidate, keyed by section slug.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateInsights(
    #[serde(with = "serde_string_map")] pub HashMap<SectionKind, SectionEntry>,
);

impl Deref for CandidateInsights {
    type Target = HashMap<SectionKind, SectionEntry>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Core election data, as stored in the database.
///
/// The election document exclusively owns its insight map; the pipeline
/// writes sections through [`Election::upsert_section`] and
/// [`Election::set_pdf_uploaded`] only.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionCore {
    pub election_type: ElectionType,
    /// Sequential display number, issued from the election number counter.
    pub number: u64,
    pub state: ElectionState,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub end_time: DateTime<Utc>,
    /// Participating candidates. Order carries no meaning.
    pub candidates: Vec<Id>,
    pub created_by: Id,
    /// Campaign-provided strategic context, embedded in every prompt.
    pub context_note: String,
    /// Generated insight sections, keyed by candidate then section.
    #[serde(default, with = "serde_string_map")]
    pub insights: HashMap<Id, CandidateInsights>,
}

impl ElectionCore {
    pub fn new(
        election_type: ElectionType,
        number: u64,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        candidates: Vec<Id>,
        created_by: Id,
        context_note: String,
    ) -> Self {
        Self {
            election_type,
            number,
            state: ElectionState::Draft,
            start_time,
            end_time,
            candidates,
            created_by,
            context_note,
            insights: HashMap::new(),
        }
    }

    /// Is the given candidate a participant in this election?
    pub fn is_participant(&self, candidate_id: Id) -> bool {
        self.candidates.contains(&candidate_id)
    }

    /// Is this a single-candidate (referendum-style) election?
    pub fn is_referendum(&self) -> bool {
        self.candidates.len() == 1
    }

    /// Look up a generated section, if any.
    pub fn section(&self, candidate_id: Id, kind: SectionKind) -> Option<&SectionEntry> {
        self.insights.get(&candidate_id)?.get(&kind)
    }
}

/// An election without an ID, ready for insertion.
pub type NewElection = ElectionCore;

/// An election from the database, with its unique ID.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Election {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub election: ElectionCore,
}

impl Deref for Election {
    type Target = ElectionCore;

    fn deref(&self) -> &Self::Target {
        &self.election
    }
}

impl DerefMut for Election {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.election
    }
}

impl Election {
    /// Dotted document path of one section entry within the insight map.
    fn section_path(candidate_id: Id, kind: SectionKind) -> String {
        format!("insights.{}.{}", candidate_id, kind.slug())
    }

    /// Write a section's freshly generated content, resetting its upload
    /// flag. Repeating this for the same (candidate, section) overwrites the
    /// content and touches nothing else; last writer wins.
    pub async fn upsert_section(
        elections: &Coll<Election>,
        election_id: Id,
        candidate_id: Id,
        kind: SectionKind,
        content: &str,
    ) -> Result<()> {
        let path = Self::section_path(candidate_id, kind);
        let update = doc! {
            "$set": {
                format!("{path}.content"): content,
                format!("{path}.pdfUploaded"): false,
            }
        };
        let result = elections
            .update_one(election_id.as_doc(), update, None)
            .await?;
        if result.matched_count != 1 {
            return Err(Error::not_found(format!("Election {}", election_id)));
        }
        Ok(())
    }

    /// Record the outcome of the render/upload sub-pipeline for a section.
    /// Set explicitly in both directions so a failed retry can never leave a
    /// stale `true` behind.
    pub async fn set_pdf_uploaded(
        elections: &Coll<Election>,
        election_id: Id,
        candidate_id: Id,
        kind: SectionKind,
        uploaded: bool,
    ) -> Result<()> {
        let path = Self::section_path(candidate_id, kind);
        let update = doc! {
            "$set": { format!("{path}.pdfUploaded"): uploaded }
        };
        let result = elections
            .update_one(election_id.as_doc(), update, None)
            .await?;
        if result.matched_count != 1 {
            return Err(Error::not_found(format!("Election {}", election_id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn example() -> Election {
        let candidate = Id::new();
        let mut insights = HashMap::new();
        let mut sections = HashMap::new();
        sections.insert(
            SectionKind::Demographic,
            SectionEntry {
                content: "A narrative.".to_string(),
                pdf_uploaded: true,
            },
        );
        insights.insert(candidate, CandidateInsights(sections));

        // Whole seconds; BSON datetimes are millisecond-precision.
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut core = ElectionCore::new(
            ElectionType::Mayoral,
            7,
            now,
            now + Duration::days(10),
            vec![candidate],
            Id::new(),
            "Focus on first-time voters.".to_string(),
        );
        core.insights = insights;
        Election {
            id: Id::new(),
            election: core,
        }
    }

    #[test]
    fn bson_round_trip() {
        let election = example();
        let document = mongodb::bson::to_document(&election).unwrap();
        let back: Election = mongodb::bson::from_document(document).unwrap();
        assert_eq!(election, back);
    }

    #[test]
    fn insight_map_keys_are_slugs() {
        let election = example();
        let document = mongodb::bson::to_document(&election).unwrap();
        let candidate = election.candidates[0];
        let entry = document
            .get_document("insights")
            .unwrap()
            .get_document(candidate.to_string())
            .unwrap()
            .get_document("demographic")
            .unwrap();
        assert_eq!(entry.get_bool("pdfUploaded").unwrap(), true);
        assert_eq!(entry.get_str("content").unwrap(), "A narrative.");
    }

    #[test]
    fn number_survives_large_counter_values() {
        let mut election = example();
        election.election.number = u64::from(u32::MAX) + 1;
        let document = mongodb::bson::to_document(&election).unwrap();
        let back: Election = mongodb::bson::from_document(document).unwrap();
        assert_eq!(back.number, u64::from(u32::MAX) + 1);
    }

    #[test]
    fn section_path_uses_slug() {
        let candidate = Id::new();
        let path = Election::section_path(candidate, SectionKind::VictoryProbability);
        assert_eq!(path, format!("insights.{candidate}.victory_probability"));
    }

    #[test]
    fn referendum_detection() {
        let mut election = example();
        assert!(election.is_referendum());
        election.election.candidates.push(Id::new());
        assert!(!election.is_referendum());
    }
}
