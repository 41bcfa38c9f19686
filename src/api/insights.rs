use rocket::{response::Redirect, serde::json::Json, Route, State};

use crate::error::{Error, Result};
use crate::insight::{InsightPipeline, PdfPublisher, SectionKind, REPORT_PREFIX};
use crate::model::{
    api::{auth::AuthToken, insight::SectionStatus},
    db::{candidate::Candidate, election::Election, rejection::Rejection, vote::Vote},
    mongodb::{Coll, Id},
};
use crate::services::{RendererClient, ReportStore, TextGenerator};

pub fn routes() -> Vec<Route> {
    routes![
        generate_insight,
        consolidate_insights,
        victory_probability,
        report,
    ]
}

/// Fetch the requester and election and enforce the access rules shared by
/// every insight endpoint: the requester must participate in the election,
/// and premium tiers need an active membership.
async fn authorize(
    token: &AuthToken,
    election_id: Id,
    kind: SectionKind,
    candidates: &Coll<Candidate>,
    elections: &Coll<Election>,
) -> Result<(Candidate, Election)> {
    let candidate = candidates
        .find_one(token.id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Candidate {}", token.id)))?;
    let election = elections
        .find_one(election_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election {}", election_id)))?;
    if !election.is_participant(candidate.id) {
        return Err(Error::forbidden(format!(
            "Candidate {} is not a participant of election {}",
            candidate.id, election_id
        )));
    }
    if kind.premium() && !candidate.active_membership {
        return Err(Error::payment_required(format!(
            "An active membership is required for '{}' insights",
            kind.title()
        )));
    }
    Ok((candidate, election))
}

#[post("/elections/<election_id>/insights/<kind>")]
#[allow(clippy::too_many_arguments)]
async fn generate_insight(
    token: AuthToken,
    election_id: Id,
    kind: SectionKind,
    candidates: Coll<Candidate>,
    elections: Coll<Election>,
    votes: Coll<Vote>,
    rejections: Coll<Rejection>,
    generator: &State<TextGenerator>,
    renderer: &State<RendererClient>,
    reports: &State<ReportStore>,
) -> Result<Json<SectionStatus>> {
    // Synthesised kinds have dedicated endpoints with their own inputs.
    if !kind.is_standard() {
        return Err(Error::bad_request(format!(
            "'{kind}' is not a standard section"
        )));
    }
    let (candidate, election) =
        authorize(&token, election_id, kind, &candidates, &elections).await?;

    let publisher = PdfPublisher::new(renderer.inner(), reports.inner());
    let pipeline = InsightPipeline {
        generator: generator.inner(),
        publisher: &publisher,
        store: &elections,
    };
    let pdf_uploaded = pipeline
        .generate_section(&votes, &rejections, &election, &candidate, kind)
        .await?;
    Ok(Json(SectionStatus::new(kind, pdf_uploaded)))
}

#[post("/elections/<election_id>/insights/consolidated")]
async fn consolidate_insights(
    token: AuthToken,
    election_id: Id,
    candidates: Coll<Candidate>,
    elections: Coll<Election>,
    generator: &State<TextGenerator>,
    renderer: &State<RendererClient>,
    reports: &State<ReportStore>,
) -> Result<Json<SectionStatus>> {
    let kind = SectionKind::Consolidated;
    let (candidate, election) =
        authorize(&token, election_id, kind, &candidates, &elections).await?;

    let publisher = PdfPublisher::new(renderer.inner(), reports.inner());
    let pipeline = InsightPipeline {
        generator: generator.inner(),
        publisher: &publisher,
        store: &elections,
    };
    let pdf_uploaded = pipeline.consolidate(&election, &candidate).await?;
    Ok(Json(SectionStatus::new(kind, pdf_uploaded)))
}

#[post("/elections/<election_id>/insights/victory-probability")]
#[allow(clippy::too_many_arguments)]
async fn victory_probability(
    token: AuthToken,
    election_id: Id,
    candidates: Coll<Candidate>,
    elections: Coll<Election>,
    votes: Coll<Vote>,
    rejections: Coll<Rejection>,
    generator: &State<TextGenerator>,
    renderer: &State<RendererClient>,
    reports: &State<ReportStore>,
) -> Result<Json<SectionStatus>> {
    let kind = SectionKind::VictoryProbability;
    let (candidate, election) =
        authorize(&token, election_id, kind, &candidates, &elections).await?;

    let publisher = PdfPublisher::new(renderer.inner(), reports.inner());
    let pipeline = InsightPipeline {
        generator: generator.inner(),
        publisher: &publisher,
        store: &elections,
    };
    let pdf_uploaded = pipeline
        .victory_probability(&votes, &rejections, &election, &candidate)
        .await?;
    Ok(Json(SectionStatus::new(kind, pdf_uploaded)))
}

/// Signed-access gateway for archived reports. The bucket is private; every
/// download goes through here and gets a fresh short-lived URL.
#[get("/reports/<filename>")]
async fn report(
    _token: AuthToken,
    filename: &str,
    reports: &State<ReportStore>,
) -> Result<Redirect> {
    let key = format!("{REPORT_PREFIX}/{filename}");
    if !reports.file_exists(&key).await? {
        return Err(Error::not_found(format!("Report {filename}")));
    }
    let url = reports.signed_read_url(&key).await?;
    Ok(Redirect::to(url))
}
