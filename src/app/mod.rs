// SPDX-License-Identifier: GPL-3.0-only

//! Capture page controller
//!
//! # Architecture
//!
//! - `state`: controller state types (CaptureController, Message, ViewState, Controls)
//! - `update`: message dispatcher
//! - `handlers`: per-domain message handlers
//! - `status`: status banner with self-expiring messages
//! - `task`: deferred work returned from `update()`
//! - `runtime`: tokio message loop feeding task results back
//!
//! # Flow
//!
//! ```text
//! Idle ──start──▶ Streaming ──photo──▶ PhotoReady ──upload──▶ Uploading ──▶ Streaming
//!                     │                                          ▲
//!                     └──record──▶ Recording ──stop──▶ VideoReady ┘
//! ```
//!
//! Stop returns to Idle from anywhere.

mod handlers;
mod runtime;
mod state;
mod status;
mod task;
mod update;

pub use runtime::Runtime;
pub use state::{
    CaptureController, Collaborators, Control, ControlState, Controls, Message, RecordingState,
    ViewState,
};
pub use status::{StatusKind, StatusMessage, StatusReporter};
pub use task::Task;
