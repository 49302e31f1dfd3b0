// SPDX-License-Identifier: GPL-3.0-only

//! Recording pipeline: recorder chunks → WebM blob

pub mod chunks;

pub use chunks::{RecordedChunks, collect_recording};
