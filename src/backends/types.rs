// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for device-media backends

use crate::errors::DeviceError;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::fmt;
use std::sync::Arc;

use super::{MediaRecorder, MediaStream};

/// Result type for device operations
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Lazy, finite sequence of encoded recording chunks
///
/// Ends once the recorder has finalized after a stop signal.
pub type ChunkStream = BoxStream<'static, Bytes>;

/// Which tracks to request when acquiring a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub video: bool,
    pub audio: bool,
}

impl MediaConstraints {
    /// Camera and microphone
    pub const CAMERA_AND_MICROPHONE: MediaConstraints = MediaConstraints {
        video: true,
        audio: true,
    };

    /// Camera only
    pub const CAMERA_ONLY: MediaConstraints = MediaConstraints {
        video: true,
        audio: false,
    };
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self::CAMERA_AND_MICROPHONE
    }
}

/// One raster frame of the live stream, packed RGB24
#[derive(Clone)]
pub struct MediaFrame {
    pub width: u32,
    pub height: u32,
    /// Bytes per row, may include padding
    pub stride: u32,
    pub data: Arc<[u8]>,
}

impl MediaFrame {
    /// Build a tightly packed frame from RGB bytes
    pub fn from_rgb(width: u32, height: u32, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            width,
            height,
            stride: width * 3,
            data: data.into(),
        }
    }

    /// RGB value at (x, y), clamped to the frame bounds
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8) {
        if self.width == 0 || self.height == 0 {
            return (0, 0, 0);
        }
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        let idx = (y * self.stride + x * 3) as usize;
        match self.data.get(idx..idx + 3) {
            Some(px) => (px[0], px[1], px[2]),
            None => (0, 0, 0),
        }
    }
}

impl fmt::Debug for MediaFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .finish_non_exhaustive()
    }
}

/// Shared handle to an acquired stream
///
/// Cloning shares the same underlying stream; [`StreamHandle::same_as`]
/// compares identity so late completions can tell whether the stream they
/// were started on is still the current one.
#[derive(Clone)]
pub struct StreamHandle(Arc<dyn MediaStream>);

impl StreamHandle {
    pub fn new(stream: Arc<dyn MediaStream>) -> Self {
        Self(stream)
    }

    /// True if both handles refer to the same stream
    pub fn same_as(&self, other: &StreamHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::ops::Deref for StreamHandle {
    type Target = dyn MediaStream;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandle")
            .field("active", &self.0.is_active())
            .finish()
    }
}

/// A started recording: the control handle plus its chunk output
pub struct Recording {
    pub recorder: Box<dyn MediaRecorder>,
    pub chunks: ChunkStream,
}

impl fmt::Debug for Recording {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recording")
            .field("active", &self.recorder.is_active())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_lookup_respects_stride() {
        // 2x2 frame with one byte of row padding
        let data: Vec<u8> = vec![
            1, 2, 3, 4, 5, 6, 0, //
            7, 8, 9, 10, 11, 12, 0,
        ];
        let frame = MediaFrame {
            width: 2,
            height: 2,
            stride: 7,
            data: data.into(),
        };
        assert_eq!(frame.pixel(1, 0), (4, 5, 6));
        assert_eq!(frame.pixel(0, 1), (7, 8, 9));
        // Out of bounds clamps to the last pixel
        assert_eq!(frame.pixel(9, 9), (10, 11, 12));
    }
}
