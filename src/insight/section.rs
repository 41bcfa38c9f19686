use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use rocket::request::FromParam;
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Key prefix under which all report PDFs are stored in the blob store.
pub const REPORT_PREFIX: &str = "allinsights";

/// The closed set of insight report sections.
///
/// Sections are keyed in the database by their slug, never by free-form
/// strings, so a typo cannot silently create an orphan section.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Demographic,
    Education,
    Living,
    Economy,
    Policy,
    Sentiments,
    Consolidated,
    VictoryProbability,
}

/// The six individually generated sections, in presentation order.
/// Consolidation reads these; it never reads itself or the victory estimate.
pub const STANDARD_SECTIONS: [SectionKind; 6] = [
    SectionKind::Demographic,
    SectionKind::Education,
    SectionKind::Living,
    SectionKind::Economy,
    SectionKind::Policy,
    SectionKind::Sentiments,
];

impl SectionKind {
    /// Storage slug, used in map keys and PDF object names.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Demographic => "demographic",
            Self::Education => "education",
            Self::Living => "living",
            Self::Economy => "economy",
            Self::Policy => "policy",
            Self::Sentiments => "sentiments",
            Self::Consolidated => "consolidated",
            Self::VictoryProbability => "victory_probability",
        }
    }

    /// Human-readable section title, as shown in reports and in the
    /// external insight-map shape.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Demographic => "Demographic Profile",
            Self::Education => "Educational Journey",
            Self::Living => "Living Context",
            Self::Economy => "Economic Factors",
            Self::Policy => "Policy Awareness & Political Behavior",
            Self::Sentiments => "Sentiment & Expectations",
            Self::Consolidated => "Consolidated Insight",
            Self::VictoryProbability => "Probability of Victory",
        }
    }

    /// The ballot fields this section's narrative is built from.
    /// Empty for the synthesised sections, which do not project raw ballots.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            Self::Demographic => &["age", "gender", "maritalStatus", "religion"],
            Self::Education => &["age", "education"],
            Self::Living => &["dwellingType", "province", "district", "monthlyRent"],
            Self::Economy => &["employment", "sector", "monthlyRent"],
            Self::Policy => &[
                "policyFamiliarity",
                "policyUnderstanding",
                "partySupport",
                "relativeVoteLikelihood",
            ],
            Self::Sentiments => &[
                "opinionOfCandidate",
                "expectations",
                "reasons",
                "relativeVoteLikelihood",
            ],
            Self::Consolidated | Self::VictoryProbability => &[],
        }
    }

    /// Premium sections require an active membership.
    pub fn premium(&self) -> bool {
        matches!(
            self,
            Self::Policy | Self::Sentiments | Self::Consolidated | Self::VictoryProbability
        )
    }

    /// Is this one of the six individually generated sections?
    pub fn is_standard(&self) -> bool {
        STANDARD_SECTIONS.contains(self)
    }

    /// Target word range for the generated narrative.
    pub fn word_range(&self) -> (u32, u32) {
        if self.premium() {
            (1200, 2000)
        } else {
            (500, 1000)
        }
    }

    /// Output token budget for the text-generation call, sized to the word
    /// range with headroom.
    pub fn max_tokens(&self) -> u32 {
        if self.premium() {
            3072
        } else {
            2048
        }
    }

    /// Deterministic blob-store key for this section's PDF.
    pub fn pdf_key(&self, election_id: Id, candidate_id: Id) -> String {
        format!(
            "{}/{}_{}_{}.pdf",
            REPORT_PREFIX,
            self.slug(),
            election_id,
            candidate_id
        )
    }
}

impl Display for SectionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for SectionKind {
    type Err = UnknownSection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "demographic" => Ok(Self::Demographic),
            "education" => Ok(Self::Education),
            "living" => Ok(Self::Living),
            "economy" => Ok(Self::Economy),
            "policy" => Ok(Self::Policy),
            "sentiments" => Ok(Self::Sentiments),
            "consolidated" => Ok(Self::Consolidated),
            "victory_probability" => Ok(Self::VictoryProbability),
            _ => Err(UnknownSection(s.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown insight section '{0}'")]
pub struct UnknownSection(String);

impl<'a> FromParam<'a> for SectionKind {
    type Error = UnknownSection;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        param.parse()
    }
}

/// One entry in an election's insight map.
///
/// An entry only exists after a successful generation, so `content` is
/// always present; `pdf_uploaded` tracks the render/upload sub-pipeline
/// independently and is only `true` when an upload was confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionEntry {
    pub content: String,
    pub pdf_uploaded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_round_trip() {
        for kind in [
            SectionKind::Demographic,
            SectionKind::Education,
            SectionKind::Living,
            SectionKind::Economy,
            SectionKind::Policy,
            SectionKind::Sentiments,
            SectionKind::Consolidated,
            SectionKind::VictoryProbability,
        ] {
            assert_eq!(kind.slug().parse::<SectionKind>().unwrap(), kind);
        }
    }

    #[test]
    fn standard_set_excludes_synthesised_sections() {
        assert!(!STANDARD_SECTIONS.contains(&SectionKind::Consolidated));
        assert!(!STANDARD_SECTIONS.contains(&SectionKind::VictoryProbability));
        assert!(SectionKind::Demographic.is_standard());
        assert!(!SectionKind::Consolidated.is_standard());
    }

    #[test]
    fn pdf_key_convention() {
        let election = Id::new();
        let candidate = Id::new();
        let key = SectionKind::VictoryProbability.pdf_key(election, candidate);
        assert_eq!(
            key,
            format!("allinsights/victory_probability_{election}_{candidate}.pdf")
        );
    }

    #[test]
    fn serde_uses_slugs() {
        let json = serde_json::to_string(&SectionKind::VictoryProbability).unwrap();
        assert_eq!(json, "\"victory_probability\"");
    }

    #[test]
    fn entry_serialises_with_camel_case_flag() {
        let entry = SectionEntry {
            content: "narrative".to_string(),
            pdf_uploaded: false,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["pdfUploaded"], false);
    }

    #[test]
    fn premium_tiers_have_larger_word_range() {
        assert_eq!(SectionKind::Demographic.word_range(), (500, 1000));
        assert_eq!(SectionKind::Policy.word_range(), (1200, 2000));
        assert!(SectionKind::Consolidated.premium());
        assert!(!SectionKind::Living.premium());
    }
}
