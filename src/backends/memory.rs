// SPDX-License-Identifier: GPL-3.0-only

//! In-process device backend
//!
//! Serves a fixed frame and a scripted list of recording chunks, and can be
//! told to refuse access. Used by the controller tests and for running the
//! flow without hardware.

use super::{
    DeviceResult, MediaConstraints, MediaDevices, MediaFrame, MediaRecorder, MediaStream,
    Recording, StreamHandle,
};
use crate::errors::DeviceError;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::channel::mpsc;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

/// Scripted device backend
#[derive(Clone, Default)]
pub struct MemoryDevices {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    deny_with: Mutex<Option<DeviceError>>,
    frame: Mutex<Option<MediaFrame>>,
    chunks: Mutex<Vec<Bytes>>,
    acquire_delay: Mutex<Option<Duration>>,
    acquired: AtomicUsize,
    streams: Mutex<Vec<Arc<MemoryStream>>>,
}

impl MemoryDevices {
    /// Backend serving a small gradient frame and two recording chunks
    pub fn new() -> Self {
        let devices = Self::default();
        devices.set_frame(Some(test_pattern(8, 4)));
        devices.set_chunks(vec![
            Bytes::from_static(b"\x1a\x45\xdf\xa3webm-header"),
            Bytes::new(),
            Bytes::from_static(b"cluster-1"),
        ]);
        devices
    }

    /// Refuse every following acquire with `err`
    pub fn deny(&self, err: DeviceError) {
        *self.inner.deny_with.lock() = Some(err);
    }

    /// Grant access again
    pub fn allow(&self) {
        *self.inner.deny_with.lock() = None;
    }

    /// Frame served by streams acquired from now on
    pub fn set_frame(&self, frame: Option<MediaFrame>) {
        *self.inner.frame.lock() = frame;
    }

    /// Chunks emitted by recorders started from now on
    pub fn set_chunks(&self, chunks: Vec<Bytes>) {
        *self.inner.chunks.lock() = chunks;
    }

    /// Simulate a permission prompt the user takes a while to answer
    pub fn set_acquire_delay(&self, delay: Option<Duration>) {
        *self.inner.acquire_delay.lock() = delay;
    }

    /// Number of acquire calls so far, granted or not
    pub fn acquire_count(&self) -> usize {
        self.inner.acquired.load(Ordering::SeqCst)
    }

    /// Every stream handed out so far
    pub fn streams(&self) -> Vec<Arc<MemoryStream>> {
        self.inner.streams.lock().clone()
    }

    /// Most recently granted stream
    pub fn last_stream(&self) -> Option<Arc<MemoryStream>> {
        self.inner.streams.lock().last().cloned()
    }
}

#[async_trait]
impl MediaDevices for MemoryDevices {
    async fn acquire(&self, constraints: MediaConstraints) -> DeviceResult<StreamHandle> {
        self.inner.acquired.fetch_add(1, Ordering::SeqCst);

        let delay = *self.inner.acquire_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.inner.deny_with.lock().clone() {
            debug!(error = %err, "Memory backend refusing access");
            return Err(err);
        }

        let stream = Arc::new(MemoryStream {
            constraints,
            frame: self.inner.frame.lock().clone(),
            chunks: self.inner.chunks.lock().clone(),
            active: AtomicBool::new(true),
            releases: AtomicUsize::new(0),
            recordings: AtomicUsize::new(0),
        });
        self.inner.streams.lock().push(Arc::clone(&stream));
        Ok(StreamHandle::new(stream))
    }
}

/// Stream handed out by [`MemoryDevices`]
pub struct MemoryStream {
    pub constraints: MediaConstraints,
    frame: Option<MediaFrame>,
    chunks: Vec<Bytes>,
    active: AtomicBool,
    releases: AtomicUsize,
    recordings: AtomicUsize,
}

impl MemoryStream {
    /// How many times release() was called
    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// How many recorders were started on this stream
    pub fn recording_count(&self) -> usize {
        self.recordings.load(Ordering::SeqCst)
    }
}

impl MediaStream for MemoryStream {
    fn frame(&self) -> Option<MediaFrame> {
        if !self.is_active() {
            return None;
        }
        self.frame.clone()
    }

    fn release(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
        self.active.store(false, Ordering::SeqCst);
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn record(&self) -> DeviceResult<Recording> {
        if !self.is_active() {
            return Err(DeviceError::StreamReleased);
        }
        self.recordings.fetch_add(1, Ordering::SeqCst);

        let (tx, rx) = mpsc::unbounded();
        for chunk in &self.chunks {
            let _ = tx.unbounded_send(chunk.clone());
        }

        Ok(Recording {
            recorder: Box::new(MemoryRecorder { sender: Some(tx) }),
            chunks: rx.boxed(),
        })
    }
}

/// Recorder whose chunk stream ends as soon as it is stopped
struct MemoryRecorder {
    sender: Option<mpsc::UnboundedSender<Bytes>>,
}

impl MediaRecorder for MemoryRecorder {
    fn stop(&mut self) {
        self.sender.take();
    }

    fn is_active(&self) -> bool {
        self.sender.is_some()
    }
}

/// Horizontal RGB gradient
pub fn test_pattern(width: u32, height: u32) -> MediaFrame {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for _y in 0..height {
        for x in 0..width {
            let v = (x * 255 / width.max(1)) as u8;
            data.extend_from_slice(&[v, 255 - v, 128]);
        }
    }
    MediaFrame::from_rgb(width, height, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_denied_access() {
        let devices = MemoryDevices::new();
        devices.deny(DeviceError::PermissionDenied("blocked".into()));
        let result = devices.acquire(MediaConstraints::default()).await;
        assert!(matches!(result, Err(DeviceError::PermissionDenied(_))));
        assert_eq!(devices.acquire_count(), 1);
        assert!(devices.last_stream().is_none());
    }

    #[tokio::test]
    async fn test_chunks_end_after_stop() {
        let devices = MemoryDevices::new();
        let stream = devices.acquire(MediaConstraints::default()).await.unwrap();
        let Recording {
            mut recorder,
            chunks,
        } = stream.record().unwrap();
        recorder.stop();
        assert!(!recorder.is_active());

        let collected: Vec<Bytes> = chunks.collect().await;
        assert_eq!(collected.len(), 3);
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let devices = MemoryDevices::new();
        let stream = devices.acquire(MediaConstraints::default()).await.unwrap();
        stream.release();
        stream.release();
        assert!(!stream.is_active());
        assert!(stream.frame().is_none());
        assert!(matches!(stream.record(), Err(DeviceError::StreamReleased)));
    }

    #[test]
    fn test_pattern_size() {
        let frame = test_pattern(4, 2);
        assert_eq!(frame.data.len(), 4 * 2 * 3);
        assert_eq!(frame.pixel(0, 0), (0, 255, 128));
    }
}
