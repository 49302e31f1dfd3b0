// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// How long a status banner stays visible before it hides itself
pub const STATUS_DISPLAY_DURATION: Duration = Duration::from_secs(5);

/// Delay between an upload verdict and the follow-up navigation
pub const REDIRECT_DELAY: Duration = Duration::from_secs(1);

/// Warm-up period before the one-shot photo command grabs a frame
pub const CAMERA_WARMUP: Duration = Duration::from_millis(800);

/// Give up waiting for a first frame after this long
pub const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a pipeline may take to reach the Playing state
pub const PIPELINE_START_TIMEOUT_SECS: u64 = 5;

/// How long a recorder may take to drain after EOS before it is torn down
pub const RECORDER_FINALIZE_TIMEOUT_SECS: u64 = 10;

/// Server routes used by the upload flow
pub mod routes {
    /// Multipart upload endpoint
    pub const UPLOAD_MEDIA: &str = "/upload-media";
    /// Gallery page shown after a successful upload
    pub const UPLOAD_SUCCESS_REDIRECT: &str =
        "/add-photos-videos?message=Captured media uploaded successfully!";
    /// Login page shown when the server requires authentication
    pub const LOGIN_REDIRECT: &str = "/login?next_url=/";
}

/// Multipart form field carrying the media file
pub const UPLOAD_FIELD_NAME: &str = "file";

/// Media kinds and their wire representation
pub mod media {
    pub const PHOTO_MIME: &str = "image/png";
    pub const VIDEO_MIME: &str = "video/webm";
    pub const PHOTO_EXTENSION: &str = "png";
    pub const VIDEO_EXTENSION: &str = "webm";
    pub const PHOTO_FILE_PREFIX: &str = "capture_photo";
    pub const VIDEO_FILE_PREFIX: &str = "capture_video";
}

/// Recording pipeline parameters
pub mod recording {
    /// Nominal framerate advertised on the recorder's video input
    pub const NOMINAL_FRAMERATE: i32 = 30;
    /// Sample rate of the microphone branch
    pub const AUDIO_RATE: i32 = 48_000;
    /// Channel count of the microphone branch
    pub const AUDIO_CHANNELS: i32 = 1;
    /// Encoder deadline for vp8enc (1 = realtime)
    pub const VP8_DEADLINE: i64 = 1;
}

/// User-visible status texts
pub mod messages {
    pub const CAMERA_STARTED: &str =
        "Camera started successfully. You can snap photos or record videos.";
    pub const CAMERA_FAILED: &str =
        "Error: Could not access camera. Please check permissions and that a camera is connected.";
    pub const NO_FRAME: &str = "Error: No camera frame available yet.";
    pub const PHOTO_FAILED: &str = "Error: Could not capture photo.";
    pub const RECORDING_STARTED: &str = "Recording started...";
    pub const RECORDING_STOPPED: &str = "Recording stopped. Previewing video...";
    pub const RECORDING_FAILED: &str = "Error: Could not record video.";
    pub const NO_MEDIA: &str = "Error: No media captured to upload.";
    pub const UPLOADING: &str = "Uploading media...";
    pub const UPLOAD_SUCCESS: &str = "Upload successful! Redirecting to your media gallery...";
    pub const UPLOAD_AUTH_REQUIRED: &str = "Upload failed: You must be logged in.";
    pub const UPLOAD_NETWORK_ERROR: &str = "Network error. Check your connection or server status.";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_is_shorter_than_status() {
        // The redirect has to happen while the verdict is still on screen
        assert!(REDIRECT_DELAY < STATUS_DISPLAY_DURATION);
    }

    #[test]
    fn test_routes_are_absolute() {
        for route in [
            routes::UPLOAD_MEDIA,
            routes::UPLOAD_SUCCESS_REDIRECT,
            routes::LOGIN_REDIRECT,
        ] {
            assert!(route.starts_with('/'), "{} should be absolute", route);
        }
    }
}
