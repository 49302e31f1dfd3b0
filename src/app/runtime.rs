// SPDX-License-Identifier: GPL-3.0-only

//! Message loop driving a [`CaptureController`]
//!
//! Messages are processed one at a time on the owner's task. Futures from
//! returned [`Task`]s run on tokio and post their messages back to the
//! queue, so completions interleave with user intents in arrival order.

use super::state::{CaptureController, Message};
use super::task::Task;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::trace;

pub struct Runtime {
    controller: CaptureController,
    sender: mpsc::UnboundedSender<Message>,
    receiver: mpsc::UnboundedReceiver<Message>,
    /// Spawned futures that have not posted their message yet
    in_flight: Arc<AtomicUsize>,
}

impl Runtime {
    pub fn new(controller: CaptureController) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            controller,
            sender,
            receiver,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn controller(&self) -> &CaptureController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut CaptureController {
        &mut self.controller
    }

    /// Handle for posting messages from other tasks (key events, signals)
    pub fn sender(&self) -> mpsc::UnboundedSender<Message> {
        self.sender.clone()
    }

    /// Queue a message for processing
    pub fn dispatch(&self, message: Message) {
        // The receiver lives as long as self, so this cannot fail
        let _ = self.sender.send(message);
    }

    /// Nothing queued and nothing in flight
    pub fn is_idle(&self) -> bool {
        // in_flight drops only after the message is queued, so check it first
        self.in_flight.load(Ordering::SeqCst) == 0 && self.receiver.is_empty()
    }

    /// Run one message through the controller and spawn its task
    pub fn process(&mut self, message: Message) {
        trace!(?message, "Processing message");
        let task = self.controller.update(message);
        self.spawn(task);
    }

    fn spawn(&self, task: Task) {
        for future in task.into_futures() {
            self.in_flight.fetch_add(1, Ordering::SeqCst);
            let sender = self.sender.clone();
            let in_flight = Arc::clone(&self.in_flight);
            tokio::spawn(async move {
                let message = future.await;
                let _ = sender.send(message);
                in_flight.fetch_sub(1, Ordering::SeqCst);
            });
        }
    }

    /// Wait for the next queued message without processing it
    pub async fn next(&mut self) -> Option<Message> {
        self.receiver.recv().await
    }

    /// Process everything already queued without waiting
    ///
    /// Returns the number of messages processed.
    pub fn try_process(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(message) = self.receiver.try_recv() {
            self.process(message);
            processed += 1;
        }
        processed
    }

    /// Process one message, waiting for in-flight work if the queue is empty
    ///
    /// Returns false once the runtime is idle.
    pub async fn step(&mut self) -> bool {
        if let Ok(message) = self.receiver.try_recv() {
            self.process(message);
            return true;
        }
        if self.is_idle() {
            return false;
        }
        match self.receiver.recv().await {
            Some(message) => {
                self.process(message);
                true
            }
            None => false,
        }
    }

    /// Process messages until nothing is queued or in flight
    ///
    /// Pending status timers count as in flight, so this waits them out.
    pub async fn run_until_idle(&mut self) {
        while self.step().await {}
    }

    /// Process messages until `done` holds, the runtime goes idle, or
    /// `timeout` elapses
    ///
    /// Returns whether `done` held.
    pub async fn run_until(
        &mut self,
        timeout: Duration,
        done: impl Fn(&CaptureController) -> bool,
    ) -> bool {
        let run = async {
            loop {
                if done(&self.controller) {
                    return true;
                }
                if !self.step().await {
                    return done(&self.controller);
                }
            }
        };
        tokio::time::timeout(timeout, run).await.unwrap_or(false)
    }

    /// Route the controller asked to navigate to, if any
    pub fn take_navigation(&mut self) -> Option<String> {
        self.controller.take_navigation()
    }

    /// Tear down the controller, releasing its devices
    pub fn into_controller(self) -> CaptureController {
        self.controller
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::Collaborators;
    use crate::backends::MediaConstraints;
    use crate::backends::memory::MemoryDevices;
    use crate::errors::UploadError;
    use crate::upload::{MediaFile, UploadEndpoint, UploadResponse};
    use async_trait::async_trait;

    struct Unreachable;

    #[async_trait]
    impl UploadEndpoint for Unreachable {
        async fn upload(&self, _file: MediaFile) -> Result<UploadResponse, UploadError> {
            Err(UploadError::Network("unreachable".into()))
        }
    }

    fn runtime() -> Runtime {
        Runtime::new(CaptureController::new(Collaborators {
            devices: Arc::new(MemoryDevices::new()),
            uploader: Arc::new(Unreachable),
            constraints: MediaConstraints::default(),
        }))
    }

    #[tokio::test]
    async fn test_new_runtime_is_idle() {
        let mut runtime = runtime();
        assert!(runtime.is_idle());
        assert!(!runtime.step().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_idle_waits_out_status_timer() {
        let mut runtime = runtime();
        runtime.dispatch(Message::StartCamera);
        runtime.run_until_idle().await;

        assert!(runtime.controller().stream().is_some());
        assert!(runtime.controller().status().is_none());
    }

    #[tokio::test]
    async fn test_run_until_times_out() {
        let mut runtime = runtime();
        let reached = runtime
            .run_until(Duration::from_millis(50), |c| c.stream().is_some())
            .await;
        assert!(!reached);
    }
}
