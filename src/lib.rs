// SPDX-License-Identifier: GPL-3.0-only

//! Camera Capture - preview a camera, take a photo or a short recording,
//! and upload it to a media server
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Capture page controller, messages and the runtime loop
//! - [`backends`]: Camera and microphone access (GStreamer, in-memory)
//! - [`pipelines`]: Photo encoding and recording finalization
//! - [`upload`]: Multipart upload to the server
//! - [`media`]: Captured artifacts and their naming
//! - [`config`]: User configuration handling
//! - [`terminal`]: Interactive terminal front end
//!
//! # Example
//!
//! ```ignore
//! let config = Config::load();
//! let controller = CaptureController::new(Collaborators::from_config(&config)?);
//! let mut runtime = Runtime::new(controller);
//! runtime.dispatch(Message::StartCamera);
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod media;
pub mod pipelines;
pub mod terminal;
pub mod upload;

// Re-export commonly used types
pub use app::{CaptureController, Collaborators, Message, Runtime, ViewState};
pub use config::Config;
pub use errors::{AppError, AppResult};
pub use media::{Blob, MediaKind};
