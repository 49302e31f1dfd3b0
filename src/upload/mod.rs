// SPDX-License-Identifier: GPL-3.0-only

//! Media upload
//!
//! The controller hands a [`MediaFile`] to an [`UploadEndpoint`] and turns
//! the response into an [`UploadOutcome`]. The HTTP implementation lives in
//! [`http`].

pub mod http;

pub use http::HttpUploader;

use crate::constants::{messages, routes};
use crate::errors::UploadError;
use crate::media::Blob;
use async_trait::async_trait;

/// Named file to send as the multipart `file` field
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub filename: String,
    pub blob: Blob,
}

/// What the server answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResponse {
    pub status: u16,
    /// Canonical reason phrase for `status`, empty if unknown
    pub reason: String,
    /// Response body, kept for diagnostics
    pub body: String,
}

/// Remote endpoint accepting a multipart media upload
#[async_trait]
pub trait UploadEndpoint: Send + Sync {
    /// Send one file
    ///
    /// # Returns
    /// * `Ok(UploadResponse)` - The server answered, whatever the status
    /// * `Err(UploadError)` - No response was received
    async fn upload(&self, file: MediaFile) -> Result<UploadResponse, UploadError>;
}

/// Verdict derived from the response status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// 2xx, or the server's 303 redirect to the gallery
    Success,
    /// 401 / 403
    AuthRequired,
    /// Anything else
    Rejected { status: u16, reason: String },
}

impl UploadOutcome {
    pub fn classify(status: u16, reason: &str) -> Self {
        match status {
            200..=299 | 303 => UploadOutcome::Success,
            401 | 403 => UploadOutcome::AuthRequired,
            _ => UploadOutcome::Rejected {
                status,
                reason: reason.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Success)
    }

    /// Status banner text
    pub fn status_message(&self) -> String {
        match self {
            UploadOutcome::Success => messages::UPLOAD_SUCCESS.to_string(),
            UploadOutcome::AuthRequired => messages::UPLOAD_AUTH_REQUIRED.to_string(),
            UploadOutcome::Rejected { status, reason } => {
                format!("Upload failed: {} {}", status, reason).trim_end().to_string()
            }
        }
    }

    /// Route to navigate to after the redirect delay
    pub fn redirect(&self) -> Option<&'static str> {
        match self {
            UploadOutcome::Success => Some(routes::UPLOAD_SUCCESS_REDIRECT),
            UploadOutcome::AuthRequired => Some(routes::LOGIN_REDIRECT),
            UploadOutcome::Rejected { .. } => None,
        }
    }
}

impl From<&UploadResponse> for UploadOutcome {
    fn from(response: &UploadResponse) -> Self {
        UploadOutcome::classify(response.status, &response.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_success() {
        assert_eq!(UploadOutcome::classify(200, "OK"), UploadOutcome::Success);
        assert_eq!(UploadOutcome::classify(201, "Created"), UploadOutcome::Success);
        assert_eq!(UploadOutcome::classify(303, "See Other"), UploadOutcome::Success);
    }

    #[test]
    fn test_classify_auth() {
        assert_eq!(UploadOutcome::classify(401, ""), UploadOutcome::AuthRequired);
        assert_eq!(UploadOutcome::classify(403, ""), UploadOutcome::AuthRequired);
    }

    #[test]
    fn test_other_redirects_are_failures() {
        // Only the gallery redirect counts; a 302 to somewhere else does not
        assert!(!UploadOutcome::classify(302, "Found").is_success());
        assert!(!UploadOutcome::classify(500, "Internal Server Error").is_success());
    }

    #[test]
    fn test_failure_message_includes_code() {
        let outcome = UploadOutcome::classify(500, "Internal Server Error");
        assert_eq!(
            outcome.status_message(),
            "Upload failed: 500 Internal Server Error"
        );
        assert_eq!(outcome.redirect(), None);

        let unknown = UploadOutcome::classify(599, "");
        assert_eq!(unknown.status_message(), "Upload failed: 599");
    }

    #[test]
    fn test_redirect_targets() {
        assert_eq!(
            UploadOutcome::Success.redirect(),
            Some("/add-photos-videos?message=Captured media uploaded successfully!")
        );
        assert_eq!(
            UploadOutcome::AuthRequired.redirect(),
            Some("/login?next_url=/")
        );
    }
}
