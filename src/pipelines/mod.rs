// SPDX-License-Identifier: GPL-3.0-only

//! Turning live capture into uploadable blobs
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ MediaFrame   │ ──▶ │  Photo Pipeline   │ ──▶ │  PNG Blob    │
//! │   (RGB24)    │     │  - stride unpack  │     │              │
//! │              │     │  - PNG encoding   │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//!
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ ChunkStream  │ ──▶ │  Video Pipeline   │ ──▶ │  WebM Blob   │
//! │  (recorder)  │     │  - drop empties   │     │              │
//! │              │     │  - concatenate    │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! Both run off the controller's message loop (encoding on a blocking
//! thread) so the preview keeps updating.

pub mod photo;
pub mod video;
