// SPDX-License-Identifier: GPL-3.0-only

//! Buffering of recorder output

use crate::backends::ChunkStream;
use crate::media::{Blob, MediaKind};
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use tracing::{debug, info};

/// Chunks received from one recorder, in arrival order
#[derive(Debug, Default)]
pub struct RecordedChunks {
    chunks: Vec<Bytes>,
    total: usize,
}

impl RecordedChunks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer a chunk; empty chunks carry nothing and are skipped
    pub fn push(&mut self, chunk: Bytes) {
        if chunk.is_empty() {
            return;
        }
        self.total += chunk.len();
        self.chunks.push(chunk);
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Total buffered bytes
    pub fn total_bytes(&self) -> usize {
        self.total
    }

    /// Concatenate everything into the video artifact, empty if nothing arrived
    pub fn into_blob(self) -> Blob {
        let mut joined = BytesMut::with_capacity(self.total);
        for chunk in self.chunks {
            joined.extend_from_slice(&chunk);
        }
        Blob::new(joined.freeze(), MediaKind::Video.mime())
    }
}

/// Drain a recorder's chunk stream until it finalizes
pub async fn collect_recording(mut chunks: ChunkStream) -> Blob {
    let mut buffer = RecordedChunks::new();
    while let Some(chunk) = chunks.next().await {
        debug!(size = chunk.len(), "Recording chunk");
        buffer.push(chunk);
    }
    info!(
        chunks = buffer.len(),
        bytes = buffer.total_bytes(),
        "Recording finalized"
    );
    buffer.into_blob()
}
