// SPDX-License-Identifier: GPL-3.0-only

//! Still photo pipeline: frame → PNG blob

pub mod encoding;

pub use encoding::PhotoEncoder;

use crate::backends::MediaFrame;
use crate::errors::CaptureError;
use crate::media::{Blob, MediaKind};
use tracing::info;

/// Encode a captured frame into the pending photo artifact
pub async fn capture_blob(frame: MediaFrame) -> Result<Blob, CaptureError> {
    info!(width = frame.width, height = frame.height, "Capturing photo");
    let data = PhotoEncoder::new().encode(frame).await?;
    Ok(Blob::new(data, MediaKind::Photo.mime()))
}
