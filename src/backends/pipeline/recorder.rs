// SPDX-License-Identifier: GPL-3.0-only

//! WebM recorder fed by a live stream
//!
//! The recorder owns its own pipeline:
//!
//! ```text
//! appsrc(video) ! videoconvert ! vp8enc ! queue ─┐
//!                                                ├─ webmmux ! appsink(chunks)
//! appsrc(audio) ! audioconvert ! opusenc ! queue ┘
//! ```
//!
//! The stream's appsink callbacks push into the appsrcs while the recorder
//! is attached. Every buffer the muxer emits becomes one chunk.

use super::stream::StreamShared;
use super::{element, launch, start_pipeline};
use crate::backends::{DeviceResult, MediaFrame, MediaRecorder, Recording};
use crate::constants::RECORDER_FINALIZE_TIMEOUT_SECS;
use crate::constants::recording::{AUDIO_CHANNELS, AUDIO_RATE, NOMINAL_FRAMERATE, VP8_DEADLINE};
use bytes::Bytes;
use futures::StreamExt;
use futures::channel::mpsc;
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

type ChunkSender = Arc<Mutex<Option<mpsc::UnboundedSender<Bytes>>>>;

/// Active recording session
pub struct GstRecorder {
    pipeline: gst::Pipeline,
    video_src: gst_app::AppSrc,
    audio_src: Option<gst_app::AppSrc>,
    stream: Arc<StreamShared>,
    sender: ChunkSender,
    active: bool,
}

impl GstRecorder {
    /// Build the recording pipeline and attach it to the stream
    ///
    /// # Arguments
    /// * `frame` - A current frame; its geometry fixes the video input caps
    /// * `with_audio` - Whether the stream has a microphone track
    /// * `stream` - Shared state of the stream feeding the recorder
    pub(crate) fn start(
        frame: &MediaFrame,
        with_audio: bool,
        stream: Arc<StreamShared>,
    ) -> DeviceResult<Recording> {
        info!(
            width = frame.width,
            height = frame.height,
            audio = with_audio,
            "Starting WebM recorder"
        );

        let mut description = format!(
            "appsrc name=video ! videoconvert ! vp8enc deadline={} ! queue ! \
             webmmux name=mux streamable=true ! appsink name=chunks sync=false",
            VP8_DEADLINE
        );
        if with_audio {
            description.push_str(" appsrc name=audio ! audioconvert ! opusenc ! queue ! mux.");
        }
        let pipeline = launch(&description)?;

        let video_src: gst_app::AppSrc = element(&pipeline, "video")?;
        configure_source(
            &video_src,
            &gst::Caps::builder("video/x-raw")
                .field("format", "RGB")
                .field("width", frame.width as i32)
                .field("height", frame.height as i32)
                .field("framerate", gst::Fraction::new(NOMINAL_FRAMERATE, 1))
                .build(),
        );

        let audio_src = if with_audio {
            let src: gst_app::AppSrc = element(&pipeline, "audio")?;
            configure_source(
                &src,
                &gst::Caps::builder("audio/x-raw")
                    .field("format", "S16LE")
                    .field("layout", "interleaved")
                    .field("rate", AUDIO_RATE)
                    .field("channels", AUDIO_CHANNELS)
                    .build(),
            );
            Some(src)
        } else {
            None
        };

        let (tx, rx) = mpsc::unbounded();
        let sender: ChunkSender = Arc::new(Mutex::new(Some(tx)));

        let chunks: gst_app::AppSink = element(&pipeline, "chunks")?;
        let sample_sender = Arc::clone(&sender);
        let eos_sender = Arc::clone(&sender);
        chunks.set_callbacks(
            gst_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let sample = appsink.pull_sample().map_err(|_| gst::FlowError::Eos)?;
                    let buffer = sample.buffer().ok_or(gst::FlowError::Error)?;
                    let map = buffer.map_readable().map_err(|_| gst::FlowError::Error)?;
                    if let Some(tx) = sample_sender.lock().as_ref() {
                        let _ = tx.unbounded_send(Bytes::copy_from_slice(map.as_slice()));
                    }
                    Ok(gst::FlowSuccess::Ok)
                })
                .eos(move |_| {
                    debug!("Recorder output reached end of stream");
                    eos_sender.lock().take();
                })
                .build(),
        );

        start_pipeline(&pipeline)?;

        // Only one recorder may be attached at a time
        stream.detach_taps();
        *stream.video_tap.lock() = Some(video_src.clone());
        if let Some(src) = &audio_src {
            *stream.audio_tap.lock() = Some(src.clone());
        }

        let recorder = GstRecorder {
            pipeline,
            video_src,
            audio_src,
            stream,
            sender,
            active: true,
        };

        Ok(Recording {
            recorder: Box::new(recorder),
            chunks: rx.boxed(),
        })
    }
}

fn configure_source(src: &gst_app::AppSrc, caps: &gst::Caps) {
    src.set_caps(Some(caps));
    src.set_format(gst::Format::Time);
    src.set_is_live(true);
    src.set_do_timestamp(true);
}

impl MediaRecorder for GstRecorder {
    fn stop(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        info!("Stopping recorder");

        self.stream.detach_taps();
        for src in std::iter::once(&self.video_src).chain(self.audio_src.as_ref()) {
            if let Err(e) = src.end_of_stream() {
                debug!(?e, "Recorder input already finished");
            }
        }

        // Drain on a helper thread; the chunk stream ends when it is done
        let pipeline = self.pipeline.clone();
        let sender = Arc::clone(&self.sender);
        std::thread::spawn(move || {
            if let Some(bus) = pipeline.bus() {
                match bus.timed_pop_filtered(
                    gst::ClockTime::from_seconds(RECORDER_FINALIZE_TIMEOUT_SECS),
                    &[gst::MessageType::Eos, gst::MessageType::Error],
                ) {
                    Some(msg) => match msg.view() {
                        gst::MessageView::Eos(..) => info!("Recording finalized"),
                        gst::MessageView::Error(err) => error!(
                            error = %err.error(),
                            debug = ?err.debug(),
                            "Recorder failed while finalizing"
                        ),
                        _ => {}
                    },
                    None => warn!("Recorder did not finalize in time, tearing it down"),
                }
            }

            if let Err(e) = pipeline.set_state(gst::State::Null) {
                warn!(?e, "Failed to stop recorder pipeline");
            }
            sender.lock().take();
        });
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for GstRecorder {
    fn drop(&mut self) {
        self.stop();
    }
}
