// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for constants module

use camera_capture::constants::{STATUS_DISPLAY_DURATION, media, messages, routes};
use camera_capture::media::MediaKind;
use std::time::Duration;

#[test]
fn test_status_duration() {
    assert_eq!(STATUS_DISPLAY_DURATION, Duration::from_secs(5));
}

#[test]
fn test_media_kinds_map_to_wire_types() {
    assert_eq!(MediaKind::Photo.mime(), media::PHOTO_MIME);
    assert_eq!(MediaKind::Video.mime(), media::VIDEO_MIME);
    assert_eq!(MediaKind::Photo.mime(), "image/png");
    assert_eq!(MediaKind::Video.mime(), "video/webm");
}

#[test]
fn test_upload_filenames() {
    assert_eq!(
        MediaKind::Photo.filename(1_700_000_000_123),
        "capture_photo_1700000000123.png"
    );
    assert_eq!(
        MediaKind::Video.filename(1_700_000_000_123),
        "capture_video_1700000000123.webm"
    );
}

#[test]
fn test_redirect_routes() {
    assert_eq!(routes::UPLOAD_MEDIA, "/upload-media");
    assert_eq!(routes::LOGIN_REDIRECT, "/login?next_url=/");
    assert!(routes::UPLOAD_SUCCESS_REDIRECT.starts_with("/add-photos-videos?message="));
}

#[test]
fn test_error_messages_are_marked() {
    for message in [
        messages::CAMERA_FAILED,
        messages::NO_FRAME,
        messages::NO_MEDIA,
    ] {
        assert!(message.starts_with("Error:"), "{}", message);
    }
}
