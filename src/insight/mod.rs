//! Per-candidate insight reports: section definitions, ballot projection,
//! prompt construction, and the generate/persist/render/upload pipeline.

pub mod extract;
pub mod pipeline;
pub mod prompt;
pub mod section;

pub use pipeline::{GenerateText, InsightPipeline, PdfPublisher, PublishReport, SectionStore};
pub use section::{SectionEntry, SectionKind, REPORT_PREFIX, STANDARD_SECTIONS};
