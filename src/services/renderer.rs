//! Client for the external document renderer.
//!
//! The renderer is an opaque service that turns a title, a body, and some
//! election metadata into a binary PDF. We stage the result on the local
//! filesystem before uploading it to the blob store.

use std::path::Path;

use rocket::tokio;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::common::ElectionType;

pub struct RendererClient {
    http: reqwest::Client,
    endpoint: String,
}

/// Election metadata stamped onto each rendered report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderMetadata {
    pub election_type: ElectionType,
    pub number: u64,
    /// Render date, ISO 8601.
    pub date: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderRequest<'a> {
    title: &'a str,
    body: &'a str,
    metadata: &'a RenderMetadata,
}

impl RendererClient {
    pub fn new(endpoint: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
        }
    }

    /// Render a PDF and write it to `path`, creating the containing
    /// directory if necessary.
    pub async fn render_to_file(
        &self,
        title: &str,
        body: &str,
        metadata: &RenderMetadata,
        path: &Path,
    ) -> Result<()> {
        let request = RenderRequest {
            title,
            body,
            metadata,
        };
        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::External(format!("document render request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::External(format!(
                "document renderer returned status {status}"
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::External(format!("document render download failed: {e}")))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, &bytes).await?;
        debug!("Rendered {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}
