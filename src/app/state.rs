// SPDX-License-Identifier: GPL-3.0-only

//! Controller state management

use super::status::{StatusMessage, StatusReporter};
use crate::backends::pipeline::GstMediaDevices;
use crate::backends::{DeviceResult, MediaConstraints, MediaDevices, MediaRecorder, StreamHandle};
use crate::config::Config;
use crate::errors::{AppResult, CaptureError, UploadError};
use crate::media::{Blob, MediaKind};
use crate::upload::{HttpUploader, UploadEndpoint, UploadResponse};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Which screen the capture page is on
///
/// The visible control set is derived from this alone, see
/// [`ViewState::controls`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewState {
    /// Camera off, only "start camera" visible
    #[default]
    Idle,
    /// Live preview, ready to take a photo or start recording
    Streaming,
    /// Recording in progress
    Recording,
    /// A photo was captured and can be uploaded
    PhotoReady,
    /// A recording was finalized and can be uploaded
    VideoReady,
    /// An upload request is in flight
    Uploading(MediaKind),
}

/// Interactive elements of the capture page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    StartCamera,
    StopCamera,
    TakePhoto,
    StartRecording,
    StopRecording,
    UploadPhoto,
    UploadVideo,
}

impl Control {
    pub const ALL: [Control; 7] = [
        Control::StartCamera,
        Control::StopCamera,
        Control::TakePhoto,
        Control::StartRecording,
        Control::StopRecording,
        Control::UploadPhoto,
        Control::UploadVideo,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Control::StartCamera => "Start Camera",
            Control::StopCamera => "Stop Camera",
            Control::TakePhoto => "Take Photo",
            Control::StartRecording => "Start Recording",
            Control::StopRecording => "Stop Recording",
            Control::UploadPhoto => "Upload Photo",
            Control::UploadVideo => "Upload Video",
        }
    }

    /// Message sent when the control is activated
    pub fn message(self) -> Message {
        match self {
            Control::StartCamera => Message::StartCamera,
            Control::StopCamera => Message::StopCamera,
            Control::TakePhoto => Message::TakePhoto,
            Control::StartRecording => Message::StartRecording,
            Control::StopRecording => Message::StopRecording,
            Control::UploadPhoto => Message::Upload(MediaKind::Photo),
            Control::UploadVideo => Message::Upload(MediaKind::Video),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlState {
    #[default]
    Hidden,
    Enabled,
    Disabled,
}

/// Visibility of every control and surface for one view state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    pub start_camera: ControlState,
    pub stop_camera: ControlState,
    pub take_photo: ControlState,
    pub start_recording: ControlState,
    pub stop_recording: ControlState,
    pub upload_photo: ControlState,
    pub upload_video: ControlState,
    pub camera_surface: bool,
    pub photo_preview: bool,
    pub video_preview: bool,
}

impl Controls {
    pub fn get(&self, control: Control) -> ControlState {
        match control {
            Control::StartCamera => self.start_camera,
            Control::StopCamera => self.stop_camera,
            Control::TakePhoto => self.take_photo,
            Control::StartRecording => self.start_recording,
            Control::StopRecording => self.stop_recording,
            Control::UploadPhoto => self.upload_photo,
            Control::UploadVideo => self.upload_video,
        }
    }

    pub fn is_visible(&self, control: Control) -> bool {
        self.get(control) != ControlState::Hidden
    }

    pub fn is_enabled(&self, control: Control) -> bool {
        self.get(control) == ControlState::Enabled
    }

    /// Visible controls in display order
    pub fn visible(&self) -> Vec<(Control, ControlState)> {
        Control::ALL
            .into_iter()
            .map(|control| (control, self.get(control)))
            .filter(|(_, state)| *state != ControlState::Hidden)
            .collect()
    }
}

impl ViewState {
    /// Project the view state onto the control set
    pub fn controls(self) -> Controls {
        use ControlState::{Disabled, Enabled};

        let live = Controls {
            stop_camera: Enabled,
            camera_surface: true,
            ..Controls::default()
        };

        match self {
            ViewState::Idle => Controls {
                start_camera: Enabled,
                ..Controls::default()
            },
            ViewState::Streaming => Controls {
                take_photo: Enabled,
                start_recording: Enabled,
                ..live
            },
            ViewState::Recording => Controls {
                take_photo: Disabled,
                stop_recording: Enabled,
                ..live
            },
            ViewState::PhotoReady => Controls {
                upload_photo: Enabled,
                photo_preview: true,
                ..live
            },
            ViewState::VideoReady => Controls {
                upload_video: Enabled,
                video_preview: true,
                ..live
            },
            ViewState::Uploading(MediaKind::Photo) => Controls {
                upload_photo: Disabled,
                photo_preview: true,
                ..live
            },
            ViewState::Uploading(MediaKind::Video) => Controls {
                upload_video: Disabled,
                video_preview: true,
                ..live
            },
        }
    }

    pub fn is_live(self) -> bool {
        !matches!(self, ViewState::Idle)
    }
}

/// Recording session state machine
#[derive(Default)]
pub enum RecordingState {
    /// No recorder
    #[default]
    Idle,
    /// Recorder running
    Recording {
        /// Identifies this session's finalize message
        session: u64,
        /// When recording started
        start_time: Instant,
        recorder: Box<dyn MediaRecorder>,
    },
    /// Stop was requested, waiting for the chunk stream to end
    Finalizing {
        session: u64,
        recorder: Box<dyn MediaRecorder>,
    },
}

impl RecordingState {
    pub fn is_recording(&self) -> bool {
        matches!(self, RecordingState::Recording { .. })
    }

    /// Session id of the recorder, running or finalizing
    pub fn session(&self) -> Option<u64> {
        match self {
            RecordingState::Idle => None,
            RecordingState::Recording { session, .. }
            | RecordingState::Finalizing { session, .. } => Some(*session),
        }
    }

    /// Elapsed recording time in seconds
    pub fn elapsed_duration(&self) -> u64 {
        match self {
            RecordingState::Recording { start_time, .. } => start_time.elapsed().as_secs(),
            _ => 0,
        }
    }

    /// Signal the recorder to finalize and move to `Finalizing`
    ///
    /// Returns false if nothing was recording.
    pub fn request_stop(&mut self) -> bool {
        match std::mem::take(self) {
            RecordingState::Recording {
                session,
                mut recorder,
                ..
            } => {
                recorder.stop();
                *self = RecordingState::Finalizing { session, recorder };
                true
            }
            other => {
                *self = other;
                false
            }
        }
    }

    /// Stop any recorder and return to `Idle`
    pub fn abort(&mut self) {
        match std::mem::take(self) {
            RecordingState::Recording { mut recorder, .. }
            | RecordingState::Finalizing { mut recorder, .. } => recorder.stop(),
            RecordingState::Idle => {}
        }
    }
}

impl fmt::Debug for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordingState::Idle => write!(f, "Idle"),
            RecordingState::Recording {
                session,
                start_time,
                ..
            } => write!(
                f,
                "Recording {{ session: {}, elapsed: {:?} }}",
                session,
                start_time.elapsed()
            ),
            RecordingState::Finalizing { session, .. } => {
                write!(f, "Finalizing {{ session: {} }}", session)
            }
        }
    }
}

/// Everything the controller needs from the outside world
#[derive(Clone)]
pub struct Collaborators {
    pub devices: Arc<dyn MediaDevices>,
    pub uploader: Arc<dyn UploadEndpoint>,
    /// Tracks requested when the camera starts
    pub constraints: MediaConstraints,
}

impl Collaborators {
    /// GStreamer devices and the HTTP uploader for the configured server
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let constraints = if config.record_audio {
            MediaConstraints::CAMERA_AND_MICROPHONE
        } else {
            MediaConstraints::CAMERA_ONLY
        };
        Ok(Self {
            devices: Arc::new(GstMediaDevices::from_config(config)),
            uploader: Arc::new(HttpUploader::from_config(config)?),
            constraints,
        })
    }
}

/// Finite-state controller of the capture page
///
/// Owns the live stream, the active recorder and the last captured photo
/// and video. All mutation goes through [`CaptureController::update`].
pub struct CaptureController {
    pub(crate) devices: Arc<dyn MediaDevices>,
    pub(crate) uploader: Arc<dyn UploadEndpoint>,
    pub(crate) constraints: MediaConstraints,
    pub(crate) view: ViewState,
    /// A camera request is outstanding
    pub(crate) acquiring: bool,
    pub(crate) stream: Option<StreamHandle>,
    pub(crate) recording: RecordingState,
    pub(crate) next_session: u64,
    pub(crate) photo: Option<Blob>,
    pub(crate) video: Option<Blob>,
    /// Which artifact the next upload sends
    pub(crate) pending: Option<MediaKind>,
    /// Bumped on every stored photo or video
    pub(crate) capture: u64,
    pub(crate) status: StatusReporter,
    /// Route the page asked to navigate to
    pub(crate) navigation: Option<String>,
}

impl CaptureController {
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            devices: collaborators.devices,
            uploader: collaborators.uploader,
            constraints: collaborators.constraints,
            view: ViewState::Idle,
            acquiring: false,
            stream: None,
            recording: RecordingState::Idle,
            next_session: 0,
            photo: None,
            video: None,
            pending: None,
            capture: 0,
            status: StatusReporter::new(),
            navigation: None,
        }
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn controls(&self) -> Controls {
        self.view.controls()
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.current()
    }

    pub fn pending(&self) -> Option<MediaKind> {
        self.pending
    }

    pub fn photo(&self) -> Option<&Blob> {
        self.photo.as_ref()
    }

    pub fn video(&self) -> Option<&Blob> {
        self.video.as_ref()
    }

    pub fn stream(&self) -> Option<&StreamHandle> {
        self.stream.as_ref()
    }

    pub fn is_acquiring(&self) -> bool {
        self.acquiring
    }

    pub fn recording(&self) -> &RecordingState {
        &self.recording
    }

    /// Route requested by the last upload, if any
    pub fn navigation(&self) -> Option<&str> {
        self.navigation.as_deref()
    }

    pub fn take_navigation(&mut self) -> Option<String> {
        self.navigation.take()
    }

    /// Keep `blob` as the new pending artifact
    pub(crate) fn store_artifact(&mut self, kind: MediaKind, blob: Blob) {
        match kind {
            MediaKind::Photo => self.photo = Some(blob),
            MediaKind::Video => self.video = Some(blob),
        }
        self.pending = Some(kind);
        self.capture += 1;
    }

    /// Drop the pending artifact if it is still capture `capture` of `kind`
    pub(crate) fn clear_uploaded(&mut self, kind: MediaKind, capture: u64) -> bool {
        if self.pending != Some(kind) || self.capture != capture {
            return false;
        }
        self.pending = None;
        match kind {
            MediaKind::Photo => self.photo = None,
            MediaKind::Video => self.video = None,
        }
        true
    }

    /// Pending blob of `kind`, if that kind is the pending one
    pub(crate) fn pending_blob(&self, kind: MediaKind) -> Option<&Blob> {
        if self.pending != Some(kind) {
            return None;
        }
        match kind {
            MediaKind::Photo => self.photo.as_ref(),
            MediaKind::Video => self.video.as_ref(),
        }
    }

    /// Stop the recorder and release the stream
    pub(crate) fn release_devices(&mut self) {
        self.recording.abort();
        if let Some(stream) = self.stream.take() {
            debug!("Releasing media stream");
            stream.release();
        }
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.release_devices();
    }
}

impl fmt::Debug for CaptureController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureController")
            .field("view", &self.view)
            .field("acquiring", &self.acquiring)
            .field("stream", &self.stream)
            .field("recording", &self.recording)
            .field("pending", &self.pending)
            .field("capture", &self.capture)
            .field("status", &self.status.current())
            .finish_non_exhaustive()
    }
}

/// Messages driving the controller
///
/// User intents come from the front end; completions come back from the
/// tasks the controller returned earlier.
#[derive(Debug, Clone)]
pub enum Message {
    // ===== User Intents =====
    StartCamera,
    StopCamera,
    TakePhoto,
    StartRecording,
    StopRecording,
    Upload(MediaKind),

    // ===== Completions =====
    /// Camera request answered
    CameraStarted(DeviceResult<StreamHandle>),
    /// Photo encoded from a frame of `stream`
    PhotoCaptured {
        stream: StreamHandle,
        result: Result<Blob, CaptureError>,
    },
    /// Chunk stream of recording `session` ended
    RecordingFinalized {
        session: u64,
        blob: Blob,
    },
    /// Upload request answered or failed
    UploadFinished {
        kind: MediaKind,
        /// Capture generation that was sent
        capture: u64,
        result: Result<UploadResponse, UploadError>,
    },

    // ===== Timers =====
    /// Hide status message `id` if still shown
    StatusExpired(u64),
    /// Leave the capture page for a server route
    Navigate(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_shows_only_start() {
        let controls = ViewState::Idle.controls();
        assert_eq!(
            controls.visible(),
            vec![(Control::StartCamera, ControlState::Enabled)]
        );
        assert!(!controls.camera_surface);
        assert!(!controls.photo_preview && !controls.video_preview);
    }

    #[test]
    fn test_recording_disables_photo() {
        let controls = ViewState::Recording.controls();
        assert_eq!(controls.take_photo, ControlState::Disabled);
        assert!(controls.is_enabled(Control::StopRecording));
        assert!(controls.is_enabled(Control::StopCamera));
        assert!(!controls.is_visible(Control::StartRecording));
    }

    #[test]
    fn test_uploading_disables_its_button() {
        let controls = ViewState::Uploading(MediaKind::Video).controls();
        assert_eq!(controls.upload_video, ControlState::Disabled);
        assert!(!controls.is_visible(Control::UploadPhoto));
        assert!(controls.video_preview);
        assert!(!controls.photo_preview);
    }

    #[test]
    fn test_start_visible_only_when_idle() {
        for view in [
            ViewState::Streaming,
            ViewState::Recording,
            ViewState::PhotoReady,
            ViewState::VideoReady,
            ViewState::Uploading(MediaKind::Photo),
        ] {
            let controls = view.controls();
            assert!(!controls.is_visible(Control::StartCamera), "{:?}", view);
            assert!(controls.camera_surface, "{:?}", view);
        }
    }

    #[test]
    fn test_upload_buttons_are_exclusive() {
        for view in [
            ViewState::Idle,
            ViewState::Streaming,
            ViewState::Recording,
            ViewState::PhotoReady,
            ViewState::VideoReady,
            ViewState::Uploading(MediaKind::Photo),
            ViewState::Uploading(MediaKind::Video),
        ] {
            let controls = view.controls();
            assert!(
                !(controls.is_visible(Control::UploadPhoto)
                    && controls.is_visible(Control::UploadVideo)),
                "{:?}",
                view
            );
            assert!(!(controls.photo_preview && controls.video_preview));
        }
    }

    #[test]
    fn test_recording_state_stop_moves_to_finalizing() {
        struct Flag(bool);
        impl MediaRecorder for Flag {
            fn stop(&mut self) {
                self.0 = false;
            }
            fn is_active(&self) -> bool {
                self.0
            }
        }

        let mut state = RecordingState::Recording {
            session: 3,
            start_time: Instant::now(),
            recorder: Box::new(Flag(true)),
        };
        assert!(state.request_stop());
        assert!(matches!(state, RecordingState::Finalizing { session: 3, .. }));
        assert_eq!(state.session(), Some(3));
        assert!(!state.request_stop());

        state.abort();
        assert!(state.session().is_none());
    }
}
