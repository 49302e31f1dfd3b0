// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! `update()` is a dispatcher; the handlers live in the `handlers`
//! submodules, grouped by what they act on.
//!
//! # Handler Modules
//!
//! - `handlers::camera`: camera start/stop, stream grant
//! - `handlers::capture`: photo capture, video recording
//! - `handlers::upload`: upload, status expiry, navigation

use super::state::{CaptureController, Message};
use super::task::Task;

impl CaptureController {
    /// Main message handler - routes messages to handler methods.
    ///
    /// Completion handlers re-check that the state they were started from
    /// still holds, since user actions may interleave with them.
    pub fn update(&mut self, message: Message) -> Task {
        match message {
            // ===== Camera =====
            Message::StartCamera => self.handle_start_camera(),
            Message::StopCamera => self.handle_stop_camera(),
            Message::CameraStarted(result) => self.handle_camera_started(result),

            // ===== Capture =====
            Message::TakePhoto => self.handle_take_photo(),
            Message::PhotoCaptured { stream, result } => {
                self.handle_photo_captured(stream, result)
            }
            Message::StartRecording => self.handle_start_recording(),
            Message::StopRecording => self.handle_stop_recording(),
            Message::RecordingFinalized { session, blob } => {
                self.handle_recording_finalized(session, blob)
            }

            // ===== Upload =====
            Message::Upload(kind) => self.handle_upload(kind),
            Message::UploadFinished {
                kind,
                capture,
                result,
            } => self.handle_upload_finished(kind, capture, result),

            // ===== Status & Navigation =====
            Message::StatusExpired(id) => {
                self.status.expire(id);
                Task::none()
            }
            Message::Navigate(route) => self.handle_navigate(route),
        }
    }
}
