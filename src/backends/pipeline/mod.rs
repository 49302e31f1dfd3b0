// SPDX-License-Identifier: GPL-3.0-only

//! GStreamer device-media backend
//!
//! - Preview: `<video source> ! videoconvert ! RGB ! appsink`, the latest
//!   frame is kept for photo capture and the terminal preview
//! - Microphone: `<audio source> ! audioconvert ! S16LE ! appsink`
//! - Recording: both appsinks tap into a separate
//!   `appsrc ! vp8enc / opusenc ! webmmux ! appsink` pipeline whose output
//!   buffers are the recording chunks

mod recorder;
mod stream;

pub use recorder::GstRecorder;
pub use stream::GstStream;

use super::{DeviceResult, MediaConstraints, MediaDevices, StreamHandle};
use crate::config::Config;
use crate::constants::PIPELINE_START_TIMEOUT_SECS;
use crate::errors::DeviceError;
use async_trait::async_trait;
use gstreamer as gst;
use gstreamer::prelude::*;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Camera and microphone access through GStreamer sources
#[derive(Debug, Clone)]
pub struct GstMediaDevices {
    video_source: String,
    audio_source: String,
}

impl GstMediaDevices {
    /// Create a backend from GStreamer source descriptions
    ///
    /// # Arguments
    /// * `video_source` - e.g. `autovideosrc` or `v4l2src device=/dev/video0`
    /// * `audio_source` - e.g. `autoaudiosrc` or `pulsesrc`
    pub fn new(video_source: impl Into<String>, audio_source: impl Into<String>) -> Self {
        Self {
            video_source: video_source.into(),
            audio_source: audio_source.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.video_source, &config.audio_source)
    }
}

#[async_trait]
impl MediaDevices for GstMediaDevices {
    async fn acquire(&self, constraints: MediaConstraints) -> DeviceResult<StreamHandle> {
        if !constraints.video {
            return Err(DeviceError::Backend(
                "a video track is required for capture".into(),
            ));
        }

        info!(
            video = %self.video_source,
            audio = constraints.audio,
            "Acquiring camera stream"
        );

        let video_source = self.video_source.clone();
        let audio_source = constraints.audio.then(|| self.audio_source.clone());

        // Pipeline state changes block until the device answers
        let stream = tokio::task::spawn_blocking(move || {
            GstStream::open(&video_source, audio_source.as_deref())
        })
        .await
        .map_err(|e| DeviceError::Backend(format!("Acquire task error: {}", e)))??;

        Ok(StreamHandle::new(Arc::new(stream)))
    }
}

/// Initialize GStreamer (cheap after the first call)
pub(crate) fn init() -> DeviceResult<()> {
    gst::init().map_err(|e| DeviceError::Backend(format!("GStreamer init failed: {}", e)))
}

/// Build a pipeline from a launch description
pub(crate) fn launch(description: &str) -> DeviceResult<gst::Pipeline> {
    debug!(description, "Building pipeline");
    gst::parse::launch(description)
        .map_err(|e| map_gst_error(&e))?
        .downcast::<gst::Pipeline>()
        .map_err(|_| DeviceError::Backend("Launch description did not produce a pipeline".into()))
}

/// Look up a named element and cast it to its concrete type
pub(crate) fn element<T: IsA<gst::Element>>(
    pipeline: &gst::Pipeline,
    name: &str,
) -> DeviceResult<T> {
    pipeline
        .by_name(name)
        .ok_or_else(|| DeviceError::Backend(format!("Element '{}' missing from pipeline", name)))?
        .downcast::<T>()
        .map_err(|_| DeviceError::Backend(format!("Element '{}' has an unexpected type", name)))
}

/// Set a pipeline to Playing and wait until it gets there
///
/// On failure the first error on the bus decides the error kind and the
/// pipeline is torn down again so the device is not left half-open.
pub(crate) fn start_pipeline(pipeline: &gst::Pipeline) -> DeviceResult<()> {
    let started = pipeline.set_state(gst::State::Playing).is_ok()
        && pipeline
            .state(gst::ClockTime::from_seconds(PIPELINE_START_TIMEOUT_SECS))
            .0
            .is_ok();

    if started {
        return Ok(());
    }

    let err = pipeline
        .bus()
        .and_then(|bus| bus.pop_filtered(&[gst::MessageType::Error]))
        .and_then(|msg| match msg.view() {
            gst::MessageView::Error(err) => {
                error!(
                    error = %err.error(),
                    debug = ?err.debug(),
                    source = ?err.src().map(|s| s.name()),
                    "Pipeline failed to start"
                );
                Some(map_gst_error(&err.error()))
            }
            _ => None,
        })
        .unwrap_or_else(|| DeviceError::Backend("Pipeline failed to reach Playing state".into()));

    let _ = pipeline.set_state(gst::State::Null);
    Err(err)
}

/// Translate a GStreamer error into the device error taxonomy
pub(crate) fn map_gst_error(err: &gst::glib::Error) -> DeviceError {
    let message = err.to_string();
    match err.kind::<gst::ResourceError>() {
        Some(gst::ResourceError::NotAuthorized) => DeviceError::PermissionDenied(message),
        Some(
            gst::ResourceError::NotFound
            | gst::ResourceError::OpenRead
            | gst::ResourceError::OpenReadWrite
            | gst::ResourceError::Busy,
        ) => DeviceError::NoDevice(message),
        _ => DeviceError::Backend(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_not_authorized_to_permission_denied() {
        let err = gst::glib::Error::new(gst::ResourceError::NotAuthorized, "denied");
        assert!(matches!(map_gst_error(&err), DeviceError::PermissionDenied(_)));
    }

    #[test]
    fn test_map_not_found_to_no_device() {
        let err = gst::glib::Error::new(gst::ResourceError::NotFound, "no /dev/video0");
        assert!(matches!(map_gst_error(&err), DeviceError::NoDevice(_)));
    }

    #[test]
    fn test_map_other_errors_to_backend() {
        let err = gst::glib::Error::new(gst::CoreError::Negotiation, "not negotiated");
        assert!(matches!(map_gst_error(&err), DeviceError::Backend(_)));
    }

    #[tokio::test]
    async fn test_acquire_without_video_is_rejected() {
        let devices = GstMediaDevices::new("videotestsrc", "audiotestsrc");
        let result = devices
            .acquire(MediaConstraints {
                video: false,
                audio: true,
            })
            .await;
        assert!(matches!(result, Err(DeviceError::Backend(_))));
    }
}
