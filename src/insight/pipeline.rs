//! The insight-generation pipeline.
//!
//! One invocation runs end-to-end within the request that triggered it:
//! extraction, one text-generation call, persistence, then the PDF
//! sub-pipeline (render, upload, flag update, cleanup). Generation failure
//! aborts before anything is persisted; render/upload failure is caught
//! locally and only the `pdf_uploaded` flag records it. There is no retry
//! anywhere; re-triggering the operation is safe because persistence is an
//! upsert.
//!
//! The three effectful steps (generation, publication, persistence) sit
//! behind traits; [`TextGenerator`], [`PdfPublisher`] and `Coll<Election>`
//! are the production implementations.

use std::path::PathBuf;

use chrono::Utc;
use mongodb::bson::doc;
use rocket::futures::TryStreamExt;
use rocket::http::Status;
use rocket::tokio;

use crate::error::{Error, Result};
use crate::model::{
    db::candidate::Candidate,
    db::election::{CandidateInsights, Election},
    db::rejection::Rejection,
    db::vote::Vote,
    mongodb::{Coll, Id},
};
use crate::services::{RenderMetadata, RendererClient, ReportStore, TextGenerator};

use super::extract::{project, to_prompt_json};
use super::prompt::{consolidation_prompt, section_prompt, victory_prompt};
use super::section::{SectionKind, REPORT_PREFIX, STANDARD_SECTIONS};

/// The text-generation step: one prompt in, one narrative out.
#[rocket::async_trait]
pub trait GenerateText: Send + Sync {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String>;
}

#[rocket::async_trait]
impl GenerateText for TextGenerator {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        TextGenerator::generate(self, prompt, max_tokens).await
    }
}

/// The publication step: turn persisted content into an archived PDF.
#[rocket::async_trait]
pub trait PublishReport: Send + Sync {
    async fn publish(
        &self,
        election: &Election,
        candidate_id: Id,
        kind: SectionKind,
        content: &str,
    ) -> Result<()>;
}

/// The persistence step: section content and upload flags on the election
/// document.
#[rocket::async_trait]
pub trait SectionStore: Send + Sync {
    async fn save_content(
        &self,
        election_id: Id,
        candidate_id: Id,
        kind: SectionKind,
        content: &str,
    ) -> Result<()>;

    async fn set_pdf_uploaded(
        &self,
        election_id: Id,
        candidate_id: Id,
        kind: SectionKind,
        uploaded: bool,
    ) -> Result<()>;
}

#[rocket::async_trait]
impl SectionStore for Coll<Election> {
    async fn save_content(
        &self,
        election_id: Id,
        candidate_id: Id,
        kind: SectionKind,
        content: &str,
    ) -> Result<()> {
        Election::upsert_section(self, election_id, candidate_id, kind, content).await
    }

    async fn set_pdf_uploaded(
        &self,
        election_id: Id,
        candidate_id: Id,
        kind: SectionKind,
        uploaded: bool,
    ) -> Result<()> {
        Election::set_pdf_uploaded(self, election_id, candidate_id, kind, uploaded).await
    }
}

/// Production publisher: render the PDF to a deterministic staging path,
/// upload it gzipped, and clean the staging file up whatever the outcome.
/// A crash between render and cleanup can leak the file; harmless, since a
/// retry overwrites it.
pub struct PdfPublisher<'a> {
    renderer: &'a RendererClient,
    reports: &'a ReportStore,
}

impl<'a> PdfPublisher<'a> {
    pub fn new(renderer: &'a RendererClient, reports: &'a ReportStore) -> Self {
        Self { renderer, reports }
    }
}

#[rocket::async_trait]
impl PublishReport for PdfPublisher<'_> {
    async fn publish(
        &self,
        election: &Election,
        candidate_id: Id,
        kind: SectionKind,
        content: &str,
    ) -> Result<()> {
        let path = staging_path(kind, election.id, candidate_id);
        let metadata = RenderMetadata {
            election_type: election.election_type,
            number: election.number,
            date: Utc::now().format("%Y-%m-%d").to_string(),
        };

        let result = async {
            self.renderer
                .render_to_file(kind.title(), content, &metadata, &path)
                .await?;
            self.reports.bucket_exists().await?;
            self.reports
                .upload_report(&path, &kind.pdf_key(election.id, candidate_id))
                .await
        }
        .await;

        // Cleanup failures are logged and swallowed, never surfaced.
        if let Err(e) = tokio::fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!("Failed to remove staging file {}: {e}", path.display());
            }
        }

        result
    }
}

/// One pipeline run's collaborators. Handlers assemble this from request
/// guards and managed state.
pub struct InsightPipeline<'a> {
    pub generator: &'a dyn GenerateText,
    pub publisher: &'a dyn PublishReport,
    pub store: &'a dyn SectionStore,
}

impl InsightPipeline<'_> {
    /// Generate one standard section for (election, candidate).
    /// Returns whether the PDF made it to the blob store.
    pub async fn generate_section(
        &self,
        votes: &Coll<Vote>,
        rejections: &Coll<Rejection>,
        election: &Election,
        candidate: &Candidate,
        kind: SectionKind,
    ) -> Result<bool> {
        // Extraction: this candidate's votes, plus every rejection in the
        // election. Rejections carry no candidate reference, so they are
        // projected for all candidates alike.
        let vote_filter = doc! {
            "electionId": election.id,
            "candidateId": candidate.id,
        };
        let election_votes: Vec<Vote> = votes
            .find(vote_filter, None)
            .await?
            .try_collect()
            .await?;
        let election_rejections: Vec<Rejection> = rejections
            .find(doc! { "electionId": election.id }, None)
            .await?
            .try_collect()
            .await?;

        let votes_json = to_prompt_json(&project(&election_votes, kind.fields()));
        let rejections_json = to_prompt_json(&project(&election_rejections, kind.fields()));
        let prompt = section_prompt(
            kind,
            &candidate.name,
            &election.context_note,
            &votes_json,
            &rejections_json,
        );

        // Generation. A failure here aborts with nothing persisted.
        let content = self.generator.generate(&prompt, kind.max_tokens()).await?;

        self.persist_and_publish(election, candidate.id, kind, &content)
            .await
    }

    /// Consolidate the candidate's existing sections into one summary.
    pub async fn consolidate(&self, election: &Election, candidate: &Candidate) -> Result<bool> {
        let sections = election.insights.get(&candidate.id).ok_or_else(|| {
            Error::Status(
                Status::UnprocessableEntity,
                "Generate individual insights first".to_string(),
            )
        })?;

        let combined = combine_sections(sections);
        let prompt = consolidation_prompt(&candidate.name, &election.context_note, &combined);
        let content = self
            .generator
            .generate(&prompt, SectionKind::Consolidated.max_tokens())
            .await?;

        self.persist_and_publish(election, candidate.id, SectionKind::Consolidated, &content)
            .await
    }

    /// Estimate the candidate's victory probability from raw counts and the
    /// already-generated insight map.
    pub async fn victory_probability(
        &self,
        votes: &Coll<Vote>,
        rejections: &Coll<Rejection>,
        election: &Election,
        candidate: &Candidate,
    ) -> Result<bool> {
        let candidate_votes = votes
            .count_documents(
                doc! { "electionId": election.id, "candidateId": candidate.id },
                None,
            )
            .await?;
        let total_votes = votes
            .count_documents(doc! { "electionId": election.id }, None)
            .await?;
        let total_rejections = rejections
            .count_documents(doc! { "electionId": election.id }, None)
            .await?;

        let empty = CandidateInsights::default();
        let sections = election.insights.get(&candidate.id).unwrap_or(&empty);
        let insights_json =
            serde_json::to_string(sections).expect("insight map is serialisable");

        let prompt = victory_prompt(
            &candidate.name,
            &election.context_note,
            candidate_votes,
            total_votes,
            total_rejections,
            &insights_json,
        );
        let content = self
            .generator
            .generate(&prompt, SectionKind::VictoryProbability.max_tokens())
            .await?;

        self.persist_and_publish(
            election,
            candidate.id,
            SectionKind::VictoryProbability,
            &content,
        )
        .await
    }

    /// Persist the content immediately, then attempt publication. The
    /// content survives whatever happens next; the upload flag is set
    /// explicitly in both directions.
    async fn persist_and_publish(
        &self,
        election: &Election,
        candidate_id: Id,
        kind: SectionKind,
        content: &str,
    ) -> Result<bool> {
        self.store
            .save_content(election.id, candidate_id, kind, content)
            .await?;

        match self
            .publisher
            .publish(election, candidate_id, kind, content)
            .await
        {
            Ok(()) => {
                self.store
                    .set_pdf_uploaded(election.id, candidate_id, kind, true)
                    .await?;
                Ok(true)
            }
            Err(e) => {
                warn!(
                    "PDF publication failed for section '{}' of election {} (content kept): {e}",
                    kind, election.id
                );
                self.store
                    .set_pdf_uploaded(election.id, candidate_id, kind, false)
                    .await?;
                Ok(false)
            }
        }
    }
}

/// Concatenate whichever standard sections exist, in presentation order,
/// skipping absent ones silently.
fn combine_sections(sections: &CandidateInsights) -> String {
    STANDARD_SECTIONS
        .iter()
        .filter_map(|kind| {
            sections
                .get(kind)
                .map(|entry| format!("## {}\n\n{}", kind.title(), entry.content))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Local staging path for a rendered PDF, mirroring its blob-store name.
fn staging_path(kind: SectionKind, election_id: Id, candidate_id: Id) -> PathBuf {
    std::env::temp_dir().join(REPORT_PREFIX).join(format!(
        "{}_{}_{}.pdf",
        kind.slug(),
        election_id,
        candidate_id
    ))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::Duration;

    use crate::insight::section::SectionEntry;
    use crate::model::common::ElectionType;
    use crate::model::db::candidate::CandidateCore;
    use crate::model::db::election::ElectionCore;

    use super::*;

    fn entry(content: &str) -> SectionEntry {
        SectionEntry {
            content: content.to_string(),
            pdf_uploaded: false,
        }
    }

    fn fixtures() -> (Election, Candidate) {
        let candidate = Candidate {
            id: Id::new(),
            candidate: CandidateCore {
                name: "Ayesha Khan".to_string(),
                email: "ayesha@example.com".to_string(),
                password_hash: String::new(),
                active_membership: true,
            },
        };
        let now = Utc::now();
        let mut core = ElectionCore::new(
            ElectionType::Mayoral,
            3,
            now,
            now + Duration::days(1),
            vec![candidate.id],
            Id::new(),
            String::new(),
        );
        let mut sections = HashMap::new();
        sections.insert(SectionKind::Demographic, entry("demographic text"));
        core.insights
            .insert(candidate.id, CandidateInsights(sections));
        (
            Election {
                id: Id::new(),
                election: core,
            },
            candidate,
        )
    }

    struct FixedGenerator(&'static str);

    #[rocket::async_trait]
    impl GenerateText for FixedGenerator {
        async fn generate(&self, _prompt: &str, _max_tokens: u32) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingGenerator;

    #[rocket::async_trait]
    impl GenerateText for FailingGenerator {
        async fn generate(&self, _prompt: &str, _max_tokens: u32) -> Result<String> {
            Err(Error::External("generation offline".to_string()))
        }
    }

    struct FakePublisher {
        fail: bool,
    }

    #[rocket::async_trait]
    impl PublishReport for FakePublisher {
        async fn publish(
            &self,
            _election: &Election,
            _candidate_id: Id,
            _kind: SectionKind,
            _content: &str,
        ) -> Result<()> {
            if self.fail {
                Err(Error::External("upload refused".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[derive(Debug, PartialEq)]
    enum Write {
        Content(SectionKind, String),
        Flag(SectionKind, bool),
    }

    /// Store recording every write, in order.
    #[derive(Default)]
    struct RecordingStore {
        writes: Mutex<Vec<Write>>,
    }

    #[rocket::async_trait]
    impl SectionStore for RecordingStore {
        async fn save_content(
            &self,
            _election_id: Id,
            _candidate_id: Id,
            kind: SectionKind,
            content: &str,
        ) -> Result<()> {
            self.writes
                .lock()
                .unwrap()
                .push(Write::Content(kind, content.to_string()));
            Ok(())
        }

        async fn set_pdf_uploaded(
            &self,
            _election_id: Id,
            _candidate_id: Id,
            kind: SectionKind,
            uploaded: bool,
        ) -> Result<()> {
            self.writes.lock().unwrap().push(Write::Flag(kind, uploaded));
            Ok(())
        }
    }

    #[rocket::async_test]
    async fn generation_failure_persists_nothing() {
        let (election, candidate) = fixtures();
        let store = RecordingStore::default();
        let pipeline = InsightPipeline {
            generator: &FailingGenerator,
            publisher: &FakePublisher { fail: false },
            store: &store,
        };

        let result = pipeline.consolidate(&election, &candidate).await;
        assert!(matches!(result, Err(Error::External(_))));
        assert!(store.writes.lock().unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn upload_failure_keeps_content_with_flag_down() {
        let (election, candidate) = fixtures();
        let store = RecordingStore::default();
        let pipeline = InsightPipeline {
            generator: &FixedGenerator("a synthesis"),
            publisher: &FakePublisher { fail: true },
            store: &store,
        };

        let uploaded = pipeline.consolidate(&election, &candidate).await.unwrap();
        assert!(!uploaded);
        let writes = store.writes.lock().unwrap();
        assert_eq!(
            *writes,
            vec![
                Write::Content(SectionKind::Consolidated, "a synthesis".to_string()),
                Write::Flag(SectionKind::Consolidated, false),
            ]
        );
    }

    #[rocket::async_test]
    async fn successful_retry_flips_upload_flag() {
        let (election, candidate) = fixtures();
        let store = RecordingStore::default();

        let failed = InsightPipeline {
            generator: &FixedGenerator("a synthesis"),
            publisher: &FakePublisher { fail: true },
            store: &store,
        };
        assert!(!failed.consolidate(&election, &candidate).await.unwrap());

        let retried = InsightPipeline {
            generator: &FixedGenerator("a synthesis"),
            publisher: &FakePublisher { fail: false },
            store: &store,
        };
        assert!(retried.consolidate(&election, &candidate).await.unwrap());

        let writes = store.writes.lock().unwrap();
        assert_eq!(writes.len(), 4);
        // The retry rewrites the content before the successful upload.
        assert_eq!(
            writes[2],
            Write::Content(SectionKind::Consolidated, "a synthesis".to_string())
        );
        assert_eq!(writes[3], Write::Flag(SectionKind::Consolidated, true));
    }

    #[rocket::async_test]
    async fn consolidation_requires_existing_sections() {
        let (mut election, candidate) = fixtures();
        election.election.insights.clear();
        let store = RecordingStore::default();
        let pipeline = InsightPipeline {
            generator: &FixedGenerator("a synthesis"),
            publisher: &FakePublisher { fail: false },
            store: &store,
        };

        let result = pipeline.consolidate(&election, &candidate).await;
        assert!(matches!(
            result,
            Err(Error::Status(status, _)) if status == Status::UnprocessableEntity
        ));
        assert!(store.writes.lock().unwrap().is_empty());
    }

    #[test]
    fn combine_skips_absent_sections() {
        let mut map = HashMap::new();
        map.insert(SectionKind::Economy, entry("economy text"));
        map.insert(SectionKind::Demographic, entry("demographic text"));
        let combined = combine_sections(&CandidateInsights(map));

        // Presentation order, not map order.
        let demographic_at = combined.find("Demographic Profile").unwrap();
        let economy_at = combined.find("Economic Factors").unwrap();
        assert!(demographic_at < economy_at);
        assert!(combined.contains("economy text"));
        assert!(!combined.contains("Living Context"));
    }

    #[test]
    fn combine_never_includes_synthesised_sections() {
        let mut map = HashMap::new();
        map.insert(SectionKind::Consolidated, entry("older summary"));
        map.insert(SectionKind::Sentiments, entry("sentiments text"));
        let combined = combine_sections(&CandidateInsights(map));
        assert!(!combined.contains("older summary"));
        assert!(combined.contains("sentiments text"));
    }

    #[test]
    fn staging_path_is_deterministic() {
        let election = Id::new();
        let candidate = Id::new();
        let a = staging_path(SectionKind::Living, election, candidate);
        let b = staging_path(SectionKind::Living, election, candidate);
        assert_eq!(a, b);
        assert!(a
            .to_string_lossy()
            .ends_with(&format!("allinsights/living_{election}_{candidate}.pdf")));
    }
}
