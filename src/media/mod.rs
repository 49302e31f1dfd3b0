// SPDX-License-Identifier: GPL-3.0-only

//! Captured media artifacts
//!
//! A [`Blob`] is the in-memory payload of one capture; [`MediaKind`] decides
//! its content type, extension and upload filename.

use crate::constants::media;
use bytes::Bytes;
use std::fmt;

/// Kind of captured artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Still photo (lossless PNG)
    Photo,
    /// Short recording (WebM)
    Video,
}

impl MediaKind {
    /// All kinds, for iteration in views and tests
    pub const ALL: [MediaKind; 2] = [MediaKind::Photo, MediaKind::Video];

    /// Content type of blobs of this kind
    pub fn mime(&self) -> &'static str {
        match self {
            MediaKind::Photo => media::PHOTO_MIME,
            MediaKind::Video => media::VIDEO_MIME,
        }
    }

    /// File extension (without dot)
    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Photo => media::PHOTO_EXTENSION,
            MediaKind::Video => media::VIDEO_EXTENSION,
        }
    }

    /// Upload filename for a capture taken at `epoch_ms`
    ///
    /// `capture_photo_<epoch-ms>.png` or `capture_video_<epoch-ms>.webm`.
    pub fn filename(&self, epoch_ms: i64) -> String {
        let prefix = match self {
            MediaKind::Photo => media::PHOTO_FILE_PREFIX,
            MediaKind::Video => media::VIDEO_FILE_PREFIX,
        };
        format!("{}_{}.{}", prefix, epoch_ms, self.extension())
    }

    /// Upload filename stamped with the current time
    pub fn filename_now(&self) -> String {
        self.filename(chrono::Utc::now().timestamp_millis())
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Photo => write!(f, "photo"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// In-memory binary payload of a capture
#[derive(Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Bytes,
    pub mime: &'static str,
}

impl Blob {
    pub fn new(bytes: impl Into<Bytes>, mime: &'static str) -> Self {
        Self {
            bytes: bytes.into(),
            mime,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Payloads are megabytes; only show the size
impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blob")
            .field("len", &self.bytes.len())
            .field("mime", &self.mime)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filenames() {
        assert_eq!(
            MediaKind::Photo.filename(1_700_000_000_123),
            "capture_photo_1700000000123.png"
        );
        assert_eq!(MediaKind::Video.filename(42), "capture_video_42.webm");
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(MediaKind::Photo.mime(), "image/png");
        assert_eq!(MediaKind::Video.mime(), "video/webm");
    }

    #[test]
    fn test_blob_debug_hides_payload() {
        let blob = Blob::new(vec![1u8, 2, 3], "image/png");
        assert_eq!(format!("{:?}", blob), r#"Blob { len: 3, mime: "image/png" }"#);
    }
}
