// SPDX-License-Identifier: GPL-3.0-only

//! Device-media backends
//!
//! The controller talks to the camera and microphone only through the traits
//! below, so the GStreamer implementation and the in-memory one are
//! interchangeable.
//!
//! ```text
//! ┌─────────────────────┐
//! │  CaptureController  │
//! └──────────┬──────────┘
//!            │ acquire()
//!            ▼
//! ┌─────────────────────┐
//! │    MediaDevices     │  ← permission / device lookup
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐      record()     ┌─────────────────┐
//! │     MediaStream     │ ────────────────▶ │  MediaRecorder  │
//! │ frame() / release() │                   │ + ChunkStream   │
//! └─────────────────────┘                   └─────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`pipeline`]: camera, microphone and WebM recording via GStreamer
//! - [`memory`]: in-process backend with scripted frames and chunks

pub mod memory;
pub mod pipeline;
pub mod types;

pub use types::*;

use async_trait::async_trait;

/// Entry point to the device-media subsystem
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Request access to the camera (and microphone if asked for)
    ///
    /// May take as long as the user needs to answer a permission prompt.
    ///
    /// # Returns
    /// * `Ok(StreamHandle)` - Live stream, exclusively owned by the caller
    /// * `Err(DeviceError::PermissionDenied)` - Access refused
    /// * `Err(DeviceError::NoDevice)` - No camera or microphone
    async fn acquire(&self, constraints: MediaConstraints) -> DeviceResult<StreamHandle>;
}

/// Live camera/microphone capture session
pub trait MediaStream: Send + Sync {
    /// Latest raster frame at the stream's native resolution
    fn frame(&self) -> Option<MediaFrame>;

    /// Stop every track and free the hardware
    ///
    /// Idempotent: releasing an already released stream does nothing.
    fn release(&self);

    /// Whether the tracks are still running
    fn is_active(&self) -> bool;

    /// Start a recorder fed by this stream
    fn record(&self) -> DeviceResult<Recording>;
}

/// Control handle of one recording session
pub trait MediaRecorder: Send {
    /// Ask the recorder to finalize
    ///
    /// The chunk stream ends once finalization is done. Idempotent.
    fn stop(&mut self);

    /// Whether the recorder still accepts media
    fn is_active(&self) -> bool;
}
