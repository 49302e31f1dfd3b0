// SPDX-License-Identifier: GPL-3.0-only

//! Camera start/stop handlers

use crate::app::state::{CaptureController, Message, ViewState};
use crate::app::status::StatusKind;
use crate::app::task::Task;
use crate::backends::{DeviceResult, StreamHandle};
use crate::constants::messages;
use std::sync::Arc;
use tracing::{debug, info, warn};

impl CaptureController {
    // =========================================================================
    // Camera Handlers
    // =========================================================================

    pub(crate) fn handle_start_camera(&mut self) -> Task {
        if self.acquiring || self.stream.is_some() {
            debug!(view = ?self.view, "Camera already starting or running");
            return Task::none();
        }

        info!(constraints = ?self.constraints, "Requesting camera access");
        self.acquiring = true;
        let devices = Arc::clone(&self.devices);
        let constraints = self.constraints;
        Task::perform(
            async move { devices.acquire(constraints).await },
            Message::CameraStarted,
        )
    }

    pub(crate) fn handle_camera_started(&mut self, result: DeviceResult<StreamHandle>) -> Task {
        if !self.acquiring {
            // Stop was pressed while the request was pending
            if let Ok(stream) = result {
                info!("Camera granted after stop, releasing");
                stream.release();
            }
            return Task::none();
        }
        self.acquiring = false;

        match result {
            Ok(stream) => {
                info!("Camera started");
                self.stream = Some(stream);
                self.view = ViewState::Streaming;
                self.status.show(messages::CAMERA_STARTED, StatusKind::Success)
            }
            Err(err) => {
                warn!(error = %err, "Could not access camera");
                self.view = ViewState::Idle;
                self.status.show(messages::CAMERA_FAILED, StatusKind::Error)
            }
        }
    }

    /// Release everything and return to idle; valid from any state
    pub(crate) fn handle_stop_camera(&mut self) -> Task {
        info!(view = ?self.view, "Stopping camera");
        self.acquiring = false;
        self.release_devices();
        self.photo = None;
        self.video = None;
        self.pending = None;
        self.view = ViewState::Idle;
        Task::none()
    }
}
