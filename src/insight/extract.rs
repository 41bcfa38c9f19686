//! Projection of stored ballots onto a section's field list.

use serde::Serialize;
use serde_json::{Map, Value};

/// Project every record onto the given field list, preserving record order.
/// Fields a record does not carry (e.g. vote-only fields on a rejection)
/// are simply absent from its projection.
pub fn project<T: Serialize>(records: &[T], fields: &[&str]) -> Vec<Map<String, Value>> {
    records
        .iter()
        .map(|record| {
            // Ballots always serialise to objects; a non-object here would
            // be a programming error in the model types.
            let value = serde_json::to_value(record).expect("ballots are serialisable");
            let object = value.as_object().cloned().unwrap_or_default();
            fields
                .iter()
                .filter_map(|&field| {
                    object
                        .get(field)
                        .map(|v| (field.to_string(), v.clone()))
                })
                .collect()
        })
        .collect()
}

/// Serialize projected records for embedding in a prompt.
pub fn to_prompt_json(records: &[Map<String, Value>]) -> String {
    serde_json::to_string(records).expect("projected records are serialisable")
}

#[cfg(test)]
mod tests {
    use crate::insight::section::SectionKind;
    use crate::model::{
        db::rejection::RejectionCore,
        db::vote::VoteCore,
        mongodb::Id,
    };

    use super::*;

    #[test]
    fn keeps_only_listed_fields() {
        let vote = VoteCore::example(Id::new(), Id::new(), 1);
        let projected = project(&[vote], SectionKind::Demographic.fields());

        assert_eq!(projected.len(), 1);
        let record = &projected[0];
        assert_eq!(record.len(), 4);
        assert!(record.contains_key("age"));
        assert!(record.contains_key("maritalStatus"));
        assert!(!record.contains_key("electionId"));
        assert!(!record.contains_key("voucher"));
    }

    #[test]
    fn preserves_record_order() {
        let election = Id::new();
        let candidate = Id::new();
        let votes: Vec<_> = (0..3)
            .map(|i| {
                let mut vote = VoteCore::example(election, candidate, i);
                vote.demographics.age = 20 + i as u32;
                vote
            })
            .collect();
        let projected = project(&votes, &["age"]);
        let ages: Vec<_> = projected.iter().map(|r| r["age"].as_u64().unwrap()).collect();
        assert_eq!(ages, vec![20, 21, 22]);
    }

    #[test]
    fn missing_fields_are_skipped() {
        // Rejections have no numeric likelihood or party fields; projecting
        // a vote-oriented section keeps whatever is present.
        let rejection = RejectionCore::example(Id::new(), 1);
        let projected = project(&[rejection], SectionKind::Policy.fields());
        let record = &projected[0];
        assert!(record.contains_key("relativeVoteLikelihood"));
        assert!(!record.contains_key("partySupport"));
    }

    #[test]
    fn prompt_json_is_an_array() {
        let vote = VoteCore::example(Id::new(), Id::new(), 1);
        let json = to_prompt_json(&project(&[vote], &["gender"]));
        assert!(json.starts_with('['));
        assert!(json.contains("\"gender\""));
    }
}
