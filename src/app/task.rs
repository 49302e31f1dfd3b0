// SPDX-License-Identifier: GPL-3.0-only

//! Deferred work returned from `update()`
//!
//! A [`Task`] is a batch of futures that each resolve to a [`Message`]. The
//! controller never awaits anything itself; the runtime spawns the futures
//! and feeds their messages back in.

use super::state::Message;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Batch of futures producing messages
#[must_use = "a Task does nothing unless handed to the runtime"]
pub struct Task {
    futures: Vec<BoxFuture<'static, Message>>,
}

impl Task {
    /// Nothing to do
    pub fn none() -> Self {
        Self {
            futures: Vec::new(),
        }
    }

    /// Deliver a message right away
    pub fn done(message: Message) -> Self {
        Self {
            futures: vec![futures::future::ready(message).boxed()],
        }
    }

    /// Run a future and map its output to a message
    pub fn perform<F, T>(future: F, map: impl FnOnce(T) -> Message + Send + 'static) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            futures: vec![future.map(map).boxed()],
        }
    }

    /// Deliver a message after `after` has elapsed
    pub fn delay(after: Duration, message: Message) -> Self {
        Self::perform(tokio::time::sleep(after), move |()| message)
    }

    /// Merge several tasks into one
    pub fn batch(tasks: impl IntoIterator<Item = Task>) -> Self {
        Self {
            futures: tasks.into_iter().flat_map(|task| task.futures).collect(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.futures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.futures.len()
    }

    pub fn into_futures(self) -> Vec<BoxFuture<'static, Message>> {
        self.futures
    }
}

impl Default for Task {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("futures", &self.futures.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_batch_flattens() {
        let task = Task::batch([
            Task::done(Message::StopCamera),
            Task::none(),
            Task::done(Message::TakePhoto),
        ]);
        assert_eq!(task.len(), 2);

        let messages = futures::future::join_all(task.into_futures()).await;
        assert!(matches!(messages[0], Message::StopCamera));
        assert!(matches!(messages[1], Message::TakePhoto));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_waits() {
        let start = tokio::time::Instant::now();
        let mut futures = Task::delay(Duration::from_secs(5), Message::StatusExpired(7))
            .into_futures();
        let message = futures.remove(0).await;
        assert!(matches!(message, Message::StatusExpired(7)));
        assert!(start.elapsed() >= Duration::from_secs(5));
    }
}
