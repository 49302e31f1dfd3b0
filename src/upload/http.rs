// SPDX-License-Identifier: GPL-3.0-only

//! Multipart HTTP upload via reqwest

use super::{MediaFile, UploadEndpoint, UploadResponse};
use crate::config::Config;
use crate::constants::{UPLOAD_FIELD_NAME, routes};
use crate::errors::{AppResult, UploadError};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Uploads media to `POST <server>/upload-media`
///
/// Redirects are not followed: the server answers a successful upload with
/// a 303 to its gallery, and that status is the success signal.
#[derive(Debug, Clone)]
pub struct HttpUploader {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpUploader {
    /// Create an uploader for a full endpoint URL
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| UploadError::InvalidRequest(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Uploader for the configured server
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let endpoint = config.resolve(routes::UPLOAD_MEDIA)?;
        Ok(Self::new(endpoint, config.request_timeout())?)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl UploadEndpoint for HttpUploader {
    async fn upload(&self, file: MediaFile) -> Result<UploadResponse, UploadError> {
        info!(
            endpoint = %self.endpoint,
            filename = %file.filename,
            size = file.blob.len(),
            mime = file.blob.mime,
            "Uploading media"
        );

        let length = file.blob.len() as u64;
        let part = Part::stream_with_length(file.blob.bytes, length)
            .file_name(file.filename)
            .mime_str(file.blob.mime)
            .map_err(|e| UploadError::InvalidRequest(format!("content type: {}", e)))?;
        let form = Form::new().part(UPLOAD_FIELD_NAME, part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Upload request failed");
                UploadError::Network(e.to_string())
            })?;

        let status = response.status();
        // The body is only diagnostic; a broken body does not change the verdict
        let body = response.text().await.unwrap_or_else(|e| {
            debug!(error = %e, "Could not read upload response body");
            String::new()
        });

        debug!(status = status.as_u16(), "Upload response received");
        Ok(UploadResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}
