//! Report archival in S3-compatible object storage.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use aws_sdk_s3::{
    error::SdkError, presigning::PresigningConfig, primitives::ByteStream, Client as S3Client,
};
use flate2::{write::GzEncoder, Compression};
use rocket::tokio;

use crate::error::{Error, Result};

/// Cache directive applied to uploaded reports: immutable for one year.
const REPORT_CACHE_CONTROL: &str = "public, max-age=31536000";
/// Lifetime of a signed read URL. A fresh URL is minted per request.
pub const SIGNED_URL_TTL: Duration = Duration::from_secs(15 * 60);

/// Blob store handle for archived report PDFs.
pub struct ReportStore {
    client: S3Client,
    bucket: String,
}

impl ReportStore {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// Confirm the report bucket exists and is reachable.
    pub async fn bucket_exists(&self) -> Result<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| Error::External(format!("report bucket unavailable: {e}")))?;
        Ok(())
    }

    /// Upload a locally rendered PDF, gzip-compressed, under the given key.
    pub async fn upload_report(&self, local_path: &Path, key: &str) -> Result<()> {
        let raw = tokio::fs::read(local_path).await?;
        let mut encoder = GzEncoder::new(Vec::with_capacity(raw.len() / 2), Compression::default());
        encoder.write_all(&raw)?;
        let compressed = encoder.finish()?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(compressed))
            .content_type("application/pdf")
            .content_encoding("gzip")
            .cache_control(REPORT_CACHE_CONTROL)
            .send()
            .await
            .map_err(|e| Error::External(format!("report upload failed: {e}")))?;
        debug!("Uploaded report to {key}");
        Ok(())
    }

    /// Does an object exist under the given key?
    pub async fn file_exists(&self, key: &str) -> Result<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(SdkError::ServiceError(err)) if err.err().is_not_found() => Ok(false),
            Err(e) => Err(Error::External(format!("report lookup failed: {e}"))),
        }
    }

    /// Mint a fresh, time-boxed, read-only URL for the given key.
    pub async fn signed_read_url(&self, key: &str) -> Result<String> {
        let presigning = PresigningConfig::expires_in(SIGNED_URL_TTL)
            .map_err(|e| Error::External(format!("invalid presigning config: {e}")))?;
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| Error::External(format!("failed to sign report URL: {e}")))?;
        Ok(presigned.uri().to_string())
    }
}
