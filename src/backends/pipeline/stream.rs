// SPDX-License-Identifier: GPL-3.0-only

//! Live camera/microphone stream

use super::recorder::GstRecorder;
use super::{element, init, launch, start_pipeline};
use crate::backends::{DeviceResult, MediaFrame, MediaStream, Recording};
use crate::constants::recording::{AUDIO_CHANNELS, AUDIO_RATE};
use crate::errors::DeviceError;
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;
use gstreamer_video::VideoInfo;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, error, info, warn};

/// State shared between the stream and its appsink callbacks
#[derive(Default)]
pub(crate) struct StreamShared {
    /// Latest preview frame
    pub latest: Mutex<Option<MediaFrame>>,
    /// Recorder input for video, while a recording is running
    pub video_tap: Mutex<Option<gst_app::AppSrc>>,
    /// Recorder input for audio, while a recording is running
    pub audio_tap: Mutex<Option<gst_app::AppSrc>>,
    pub frames: AtomicU64,
}

impl StreamShared {
    /// Detach the recorder inputs and signal end-of-stream on them
    pub fn detach_taps(&self) {
        for tap in [self.video_tap.lock().take(), self.audio_tap.lock().take()]
            .into_iter()
            .flatten()
        {
            if let Err(e) = tap.end_of_stream() {
                debug!(?e, "Recorder input already finished");
            }
        }
    }
}

/// Camera (and optionally microphone) capture session
pub struct GstStream {
    video_pipeline: gst::Pipeline,
    audio_pipeline: Option<gst::Pipeline>,
    shared: Arc<StreamShared>,
    active: AtomicBool,
}

impl GstStream {
    /// Open the sources and start delivering frames
    ///
    /// Blocks until both pipelines are playing or one of them failed.
    pub fn open(video_source: &str, audio_source: Option<&str>) -> DeviceResult<Self> {
        init()?;

        let shared = Arc::new(StreamShared::default());

        let video_pipeline = launch(&format!(
            "{} ! videoconvert ! video/x-raw,format=RGB ! \
             appsink name=frames sync=false max-buffers=1 drop=true",
            video_source
        ))?;
        let frames: gst_app::AppSink = element(&video_pipeline, "frames")?;
        Self::install_frame_callback(&frames, Arc::clone(&shared));

        let audio_pipeline = match audio_source {
            Some(source) => {
                let pipeline = launch(&format!(
                    "{} ! audioconvert ! audioresample ! \
                     audio/x-raw,format=S16LE,layout=interleaved,rate={},channels={} ! \
                     appsink name=samples sync=false",
                    source, AUDIO_RATE, AUDIO_CHANNELS
                ))?;
                let samples: gst_app::AppSink = element(&pipeline, "samples")?;
                Self::install_audio_callback(&samples, Arc::clone(&shared));
                Some(pipeline)
            }
            None => None,
        };

        start_pipeline(&video_pipeline)?;
        if let Some(audio) = &audio_pipeline
            && let Err(e) = start_pipeline(audio)
        {
            // Getting half a stream is not a grant
            let _ = video_pipeline.set_state(gst::State::Null);
            return Err(e);
        }

        info!(audio = audio_pipeline.is_some(), "Camera stream started");

        Ok(Self {
            video_pipeline,
            audio_pipeline,
            shared,
            active: AtomicBool::new(true),
        })
    }

    fn install_frame_callback(appsink: &gst_app::AppSink, shared: Arc<StreamShared>) {
        appsink.set_callbacks(
            gst_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let sample = appsink.pull_sample().map_err(|_| gst::FlowError::Eos)?;
                    let buffer = sample.buffer().ok_or(gst::FlowError::Error)?;
                    let caps = sample.caps().ok_or(gst::FlowError::Error)?;
                    let info = VideoInfo::from_caps(caps).map_err(|e| {
                        error!(error = %e, "Preview caps are not raw video");
                        gst::FlowError::NotNegotiated
                    })?;
                    let map = buffer.map_readable().map_err(|_| gst::FlowError::Error)?;

                    let frame = MediaFrame {
                        width: info.width(),
                        height: info.height(),
                        stride: info.stride()[0] as u32,
                        data: Arc::from(map.as_slice()),
                    };

                    let count = shared.frames.fetch_add(1, Ordering::Relaxed);
                    if count == 0 {
                        debug!(
                            width = frame.width,
                            height = frame.height,
                            "First preview frame"
                        );
                    }

                    if let Some(tap) = shared.video_tap.lock().as_ref() {
                        let copy = gst::Buffer::from_slice(Arc::clone(&frame.data));
                        if let Err(e) = tap.push_buffer(copy) {
                            debug!(?e, "Recorder rejected video frame");
                        }
                    }

                    *shared.latest.lock() = Some(frame);
                    Ok(gst::FlowSuccess::Ok)
                })
                .build(),
        );
    }

    fn install_audio_callback(appsink: &gst_app::AppSink, shared: Arc<StreamShared>) {
        appsink.set_callbacks(
            gst_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let sample = appsink.pull_sample().map_err(|_| gst::FlowError::Eos)?;
                    if let Some(tap) = shared.audio_tap.lock().as_ref() {
                        let buffer = sample.buffer().ok_or(gst::FlowError::Error)?;
                        let map = buffer.map_readable().map_err(|_| gst::FlowError::Error)?;
                        let copy = gst::Buffer::from_slice(map.as_slice().to_vec());
                        if let Err(e) = tap.push_buffer(copy) {
                            debug!(?e, "Recorder rejected audio samples");
                        }
                    }
                    Ok(gst::FlowSuccess::Ok)
                })
                .build(),
        );
    }
}

impl MediaStream for GstStream {
    fn frame(&self) -> Option<MediaFrame> {
        if !self.is_active() {
            return None;
        }
        self.shared.latest.lock().clone()
    }

    fn release(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            debug!("Stream already released");
            return;
        }

        info!("Releasing camera stream");
        self.shared.detach_taps();

        for pipeline in std::iter::once(&self.video_pipeline).chain(self.audio_pipeline.as_ref()) {
            if let Err(e) = pipeline.set_state(gst::State::Null) {
                warn!(?e, "Failed to stop capture pipeline");
            }
        }
        *self.shared.latest.lock() = None;
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn record(&self) -> DeviceResult<Recording> {
        if !self.is_active() {
            return Err(DeviceError::StreamReleased);
        }
        let frame = self.frame().ok_or(DeviceError::NoFrame)?;
        GstRecorder::start(&frame, self.audio_pipeline.is_some(), Arc::clone(&self.shared))
    }
}

impl Drop for GstStream {
    fn drop(&mut self) {
        // Dropping without release() would leak the camera
        self.release();
    }
}
