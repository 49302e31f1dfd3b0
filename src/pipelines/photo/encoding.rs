// SPDX-License-Identifier: GPL-3.0-only

//! Lossless photo encoding
//!
//! Frames arrive as RGB24 rows that may carry padding; they are repacked
//! into a tight `RgbImage` and written as PNG. Encoding is CPU-bound and
//! runs on a blocking thread.

use crate::backends::MediaFrame;
use crate::errors::CaptureError;
use image::{ImageFormat, RgbImage};
use tracing::debug;

/// PNG encoder for captured frames
#[derive(Debug, Default, Clone, Copy)]
pub struct PhotoEncoder;

impl PhotoEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Encode a frame asynchronously
    ///
    /// # Returns
    /// * `Ok(Vec<u8>)` - PNG file contents
    /// * `Err(CaptureError)` - Malformed frame or encoder failure
    pub async fn encode(&self, frame: MediaFrame) -> Result<Vec<u8>, CaptureError> {
        tokio::task::spawn_blocking(move || Self::encode_png(&frame)).await?
    }

    /// Encode a frame as PNG on the current thread
    pub fn encode_png(frame: &MediaFrame) -> Result<Vec<u8>, CaptureError> {
        let image = Self::to_rgb_image(frame)?;
        let mut buffer = Vec::new();

        image
            .write_to(&mut std::io::Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|e| CaptureError::EncodingFailed(format!("PNG encoding failed: {}", e)))?;

        debug!(size = buffer.len(), "Encoding complete");
        Ok(buffer)
    }

    /// Repack a possibly padded RGB24 frame into an `RgbImage`
    fn to_rgb_image(frame: &MediaFrame) -> Result<RgbImage, CaptureError> {
        let row_bytes = frame.width as usize * 3;
        let stride = frame.stride as usize;

        if frame.width == 0 || frame.height == 0 {
            return Err(CaptureError::InvalidFrame("frame has no pixels".into()));
        }
        if stride < row_bytes {
            return Err(CaptureError::InvalidFrame(format!(
                "stride {} is smaller than a row of {} bytes",
                stride, row_bytes
            )));
        }

        // The last row does not need its padding
        let needed = stride * (frame.height as usize - 1) + row_bytes;
        if frame.data.len() < needed {
            return Err(CaptureError::InvalidFrame(format!(
                "{} bytes for {}x{} with stride {}",
                frame.data.len(),
                frame.width,
                frame.height,
                stride
            )));
        }

        let packed: Vec<u8> = if stride == row_bytes {
            frame.data[..row_bytes * frame.height as usize].to_vec()
        } else {
            frame
                .data
                .chunks(stride)
                .take(frame.height as usize)
                .flat_map(|row| &row[..row_bytes])
                .copied()
                .collect()
        };

        RgbImage::from_raw(frame.width, frame.height, packed)
            .ok_or_else(|| CaptureError::InvalidFrame("buffer size mismatch".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::memory::test_pattern;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    #[test]
    fn test_encode_png_signature() {
        let png = PhotoEncoder::encode_png(&test_pattern(16, 8)).unwrap();
        assert_eq!(&png[..8], &PNG_SIGNATURE);
    }

    #[test]
    fn test_padded_rows_are_unpacked() {
        // 3x2 frame, stride 12 (3 bytes of padding per row)
        let mut data = vec![0u8; 12 * 2];
        data[9..12].copy_from_slice(&[0xAA, 0xAA, 0xAA]); // padding, must be dropped
        data[12..15].copy_from_slice(&[10, 20, 30]);
        let frame = MediaFrame {
            width: 3,
            height: 2,
            stride: 12,
            data: data.into(),
        };

        let png = PhotoEncoder::encode_png(&frame).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(0, 1).0, [10, 20, 30]);
        assert_eq!(decoded.get_pixel(2, 0).0, [0, 0, 0]);
    }

    #[test]
    fn test_truncated_frame_is_rejected() {
        let frame = MediaFrame::from_rgb(4, 4, vec![0u8; 10]);
        assert!(matches!(
            PhotoEncoder::encode_png(&frame),
            Err(CaptureError::InvalidFrame(_))
        ));
    }

    #[tokio::test]
    async fn test_async_encode() {
        let png = PhotoEncoder::new().encode(test_pattern(4, 4)).await.unwrap();
        assert_eq!(&png[..8], &PNG_SIGNATURE);
    }
}
