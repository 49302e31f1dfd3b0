// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the capture workflow
//!
//! Every error here is non-fatal to the page session: the controller turns
//! them into a status message and a view transition, never a panic.

use thiserror::Error;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Top-level error used by the front ends and configuration handling
#[derive(Debug, Error)]
pub enum AppError {
    /// Device access or device pipeline failure
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),
    /// Photo or recording finalization failure
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),
    /// Upload transport failure
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),
    /// Configuration could not be read or written
    #[error("Configuration error: {0}")]
    Config(String),
    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reported by the device-media collaborator
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeviceError {
    /// The user or the system refused access to the camera or microphone
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    /// No camera or microphone is available
    #[error("No device available: {0}")]
    NoDevice(String),
    /// The stream has already been released
    #[error("Stream is no longer active")]
    StreamReleased,
    /// The stream has not produced a frame yet
    #[error("No frame available yet")]
    NoFrame,
    /// Backend failure (pipeline construction, state change, ...)
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Errors while turning captured frames or chunks into a blob
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptureError {
    /// Frame buffer does not match its declared geometry
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
    /// PNG encoding failed
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
    /// Background task died before finishing
    #[error("Task error: {0}")]
    Task(String),
}

/// Transport-level upload failures (no HTTP response was received)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadError {
    /// The request could not be built (bad URL, bad content type)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// Connection refused, timeout, reset, ...
    #[error("Network error: {0}")]
    Network(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<tokio::task::JoinError> for CaptureError {
    fn from(err: tokio::task::JoinError) -> Self {
        CaptureError::Task(err.to_string())
    }
}
