// SPDX-License-Identifier: GPL-3.0-only

//! Capture operations handlers
//!
//! Handles photo capture and video recording.

use crate::app::state::{CaptureController, Message, RecordingState, ViewState};
use crate::app::status::StatusKind;
use crate::app::task::Task;
use crate::backends::{Recording, StreamHandle};
use crate::constants::messages;
use crate::errors::CaptureError;
use crate::media::{Blob, MediaKind};
use crate::pipelines::{photo, video};
use std::time::Instant;
use tracing::{debug, error, info, warn};

impl CaptureController {
    // =========================================================================
    // Photo
    // =========================================================================

    pub(crate) fn handle_take_photo(&mut self) -> Task {
        if self.view != ViewState::Streaming {
            debug!(view = ?self.view, "Photo capture not available");
            return Task::none();
        }

        let Some(stream) = self.stream.clone() else {
            info!("No stream available for photo capture");
            return Task::none();
        };

        let Some(frame) = stream.frame() else {
            warn!("Stream has not produced a frame yet");
            return self.status.show(messages::NO_FRAME, StatusKind::Error);
        };

        Task::perform(photo::capture_blob(frame), move |result| {
            Message::PhotoCaptured { stream, result }
        })
    }

    pub(crate) fn handle_photo_captured(
        &mut self,
        stream: StreamHandle,
        result: Result<Blob, CaptureError>,
    ) -> Task {
        let same_stream = self
            .stream
            .as_ref()
            .is_some_and(|current| current.same_as(&stream));
        if !same_stream || self.view != ViewState::Streaming {
            debug!(view = ?self.view, same_stream, "Discarding stale photo");
            return Task::none();
        }

        match result {
            Ok(blob) => {
                info!(size = blob.len(), "Photo captured");
                self.store_artifact(MediaKind::Photo, blob);
                self.view = ViewState::PhotoReady;
                Task::none()
            }
            Err(err) => {
                error!(error = %err, "Photo capture failed");
                self.status.show(messages::PHOTO_FAILED, StatusKind::Error)
            }
        }
    }

    // =========================================================================
    // Video
    // =========================================================================

    pub(crate) fn handle_start_recording(&mut self) -> Task {
        if self.view != ViewState::Streaming {
            debug!(view = ?self.view, "Recording not available");
            return Task::none();
        }

        let Some(stream) = self.stream.as_ref() else {
            info!("No stream available for recording");
            return Task::none();
        };

        let Recording { recorder, chunks } = match stream.record() {
            Ok(recording) => recording,
            Err(err) => {
                error!(error = %err, "Failed to start recorder");
                return self.status.show(messages::RECORDING_FAILED, StatusKind::Error);
            }
        };

        self.next_session += 1;
        let session = self.next_session;
        info!(session, "Recording started");

        self.recording = RecordingState::Recording {
            session,
            start_time: Instant::now(),
            recorder,
        };
        self.view = ViewState::Recording;

        Task::batch([
            self.status.show(messages::RECORDING_STARTED, StatusKind::Info),
            Task::perform(video::collect_recording(chunks), move |blob| {
                Message::RecordingFinalized { session, blob }
            }),
        ])
    }

    pub(crate) fn handle_stop_recording(&mut self) -> Task {
        let elapsed = self.recording.elapsed_duration();
        if self.recording.request_stop() {
            info!(elapsed_secs = elapsed, "Stopping recording");
        } else {
            debug!("No active recorder to stop");
        }
        Task::none()
    }

    pub(crate) fn handle_recording_finalized(&mut self, session: u64, blob: Blob) -> Task {
        if self.recording.session() != Some(session) || self.view != ViewState::Recording {
            debug!(session, view = ?self.view, "Discarding late recording");
            return Task::none();
        }
        self.recording = RecordingState::Idle;

        if blob.is_empty() {
            warn!(session, "Recorder produced no data");
        }
        info!(session, size = blob.len(), "Recording ready");
        self.store_artifact(MediaKind::Video, blob);
        self.view = ViewState::VideoReady;
        self.status.show(messages::RECORDING_STOPPED, StatusKind::Info)
    }
}
