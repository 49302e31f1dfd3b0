// SPDX-License-Identifier: GPL-3.0-only

//! Transient status banner
//!
//! Every message gets a fresh id and schedules its own expiry. The expiry
//! only hides the banner if it is still showing the message it was
//! scheduled for, so a newer message is never cut short by an older timer.

use super::state::Message;
use super::task::Task;
use crate::constants::STATUS_DISPLAY_DURATION;
use tracing::debug;

/// Visual style of the banner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub id: u64,
    pub text: String,
    pub kind: StatusKind,
}

#[derive(Debug, Default)]
pub struct StatusReporter {
    current: Option<StatusMessage>,
    next_id: u64,
}

impl StatusReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `text`, replacing whatever is on the banner
    ///
    /// Returns the expiry task for this message.
    pub fn show(&mut self, text: impl Into<String>, kind: StatusKind) -> Task {
        self.next_id += 1;
        let id = self.next_id;
        let text = text.into();
        debug!(id, ?kind, text = %text, "Status shown");

        self.current = Some(StatusMessage { id, text, kind });
        Task::delay(STATUS_DISPLAY_DURATION, Message::StatusExpired(id))
    }

    /// Hide the banner if it still shows message `id`
    ///
    /// Returns true if the banner was hidden.
    pub fn expire(&mut self, id: u64) -> bool {
        match &self.current {
            Some(current) if current.id == id => {
                debug!(id, "Status expired");
                self.current = None;
                true
            }
            _ => false,
        }
    }

    pub fn current(&self) -> Option<&StatusMessage> {
        self.current.as_ref()
    }

    pub fn text(&self) -> Option<&str> {
        self.current.as_ref().map(|status| status.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expire_hides_matching_message() {
        let mut status = StatusReporter::new();
        let _ = status.show("hello", StatusKind::Info);
        let id = status.current().unwrap().id;

        assert!(status.expire(id));
        assert!(status.current().is_none());
    }

    #[test]
    fn test_older_timer_does_not_hide_newer_message() {
        let mut status = StatusReporter::new();
        let _ = status.show("first", StatusKind::Info);
        let first = status.current().unwrap().id;
        let _ = status.show("second", StatusKind::Error);

        assert!(!status.expire(first));
        assert_eq!(status.text(), Some("second"));
        assert_eq!(status.current().unwrap().kind, StatusKind::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_fires_after_display_duration() {
        let mut status = StatusReporter::new();
        let task = status.show("hello", StatusKind::Success);
        let id = status.current().unwrap().id;

        let start = tokio::time::Instant::now();
        for future in task.into_futures() {
            if let Message::StatusExpired(expired) = future.await {
                status.expire(expired);
            }
        }
        assert!(start.elapsed() >= STATUS_DISPLAY_DURATION);
        assert!(status.current().is_none());
        assert!(!status.expire(id));
    }
}
