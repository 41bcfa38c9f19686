use serde::{Deserialize, Serialize};

use crate::insight::section::SectionKind;

/// Outcome of an insight-generation request. Content generation succeeding
/// is the primary success signal; PDF archival is reported separately.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionStatus {
    pub section: SectionKind,
    pub title: String,
    pub pdf_uploaded: bool,
}

impl SectionStatus {
    pub fn new(section: SectionKind, pdf_uploaded: bool) -> Self {
        Self {
            section,
            title: section.title().to_string(),
            pdf_uploaded,
        }
    }
}
