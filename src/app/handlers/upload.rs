// SPDX-License-Identifier: GPL-3.0-only

//! Upload and navigation handlers

use crate::app::state::{CaptureController, Message, ViewState};
use crate::app::status::StatusKind;
use crate::app::task::Task;
use crate::constants::{REDIRECT_DELAY, messages};
use crate::errors::UploadError;
use crate::media::MediaKind;
use crate::upload::{MediaFile, UploadOutcome, UploadResponse};
use std::sync::Arc;
use tracing::{debug, info, warn};

impl CaptureController {
    // =========================================================================
    // Upload Handlers
    // =========================================================================

    pub(crate) fn handle_upload(&mut self, kind: MediaKind) -> Task {
        let Some(blob) = self.pending_blob(kind).cloned() else {
            warn!(%kind, pending = ?self.pending, "Nothing to upload");
            return self.status.show(messages::NO_MEDIA, StatusKind::Error);
        };

        if !matches!(
            self.view,
            ViewState::Streaming | ViewState::PhotoReady | ViewState::VideoReady
        ) {
            debug!(%kind, view = ?self.view, "Upload not available");
            return Task::none();
        }

        let file = MediaFile {
            filename: kind.filename_now(),
            blob,
        };
        info!(%kind, filename = %file.filename, "Starting upload");
        self.view = ViewState::Uploading(kind);

        let capture = self.capture;
        let uploader = Arc::clone(&self.uploader);
        Task::batch([
            self.status.show(messages::UPLOADING, StatusKind::Info),
            Task::perform(
                async move { uploader.upload(file).await },
                move |result| Message::UploadFinished {
                    kind,
                    capture,
                    result,
                },
            ),
        ])
    }

    pub(crate) fn handle_upload_finished(
        &mut self,
        kind: MediaKind,
        capture: u64,
        result: Result<UploadResponse, UploadError>,
    ) -> Task {
        // Stop may have happened meanwhile; only undo our own Uploading view
        if self.view == ViewState::Uploading(kind) {
            self.view = if self.stream.is_some() {
                ViewState::Streaming
            } else {
                ViewState::Idle
            };
        }

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                warn!(%kind, error = %err, "Upload did not reach the server");
                return self
                    .status
                    .show(messages::UPLOAD_NETWORK_ERROR, StatusKind::Error);
            }
        };

        let outcome = UploadOutcome::from(&response);
        match &outcome {
            UploadOutcome::Success => {
                info!(%kind, status = response.status, "Upload accepted");
                if !self.clear_uploaded(kind, capture) {
                    debug!(%kind, capture, "Uploaded artifact was already replaced");
                }
            }
            UploadOutcome::AuthRequired => {
                warn!(%kind, status = response.status, "Upload needs a login");
            }
            UploadOutcome::Rejected { status, reason } => {
                warn!(%kind, status, reason = %reason, body = %response.body, "Upload rejected");
            }
        }

        let kind_style = if outcome.is_success() {
            StatusKind::Success
        } else {
            StatusKind::Error
        };
        let status = self.status.show(outcome.status_message(), kind_style);

        match outcome.redirect() {
            Some(route) => Task::batch([
                status,
                Task::delay(REDIRECT_DELAY, Message::Navigate(route.to_string())),
            ]),
            None => status,
        }
    }

    pub(crate) fn handle_navigate(&mut self, route: String) -> Task {
        info!(route = %route, "Navigating away from capture page");
        self.navigation = Some(route);
        Task::none()
    }
}
