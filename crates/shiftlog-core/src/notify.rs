//! Notification dispatch boundary
//!
//! Notifications are best-effort: a delivery failure is logged by the
//! caller and never rolls back or fails the data mutation it describes.

use std::fmt;
use std::sync::Mutex;

use crate::error::Result;
use crate::models::UserId;

/// What a notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCategory {
    /// End-of-day closure summary for managers
    AutoClose,
    /// Edit request lifecycle (submitted / decided)
    EditRequest,
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AutoClose => f.write_str("auto_close"),
            Self::EditRequest => f.write_str("edit_request"),
        }
    }
}

/// Trait for notification delivery (async)
#[allow(async_fn_in_trait)]
pub trait NotificationSink {
    /// Deliver one notification to one recipient
    async fn notify(
        &self,
        recipient: &UserId,
        category: NotificationCategory,
        summary: &str,
    ) -> Result<()>;
}

/// Sink that writes notifications to the log; stands in for the hosted
/// delivery service in local and CLI use
pub struct TracingSink;

impl NotificationSink for TracingSink {
    async fn notify(
        &self,
        recipient: &UserId,
        category: NotificationCategory,
        summary: &str,
    ) -> Result<()> {
        tracing::info!(%recipient, %category, summary, "notification");
        Ok(())
    }
}

/// One captured notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub recipient: UserId,
    pub category: NotificationCategory,
    pub summary: String,
}

/// Sink that records everything it is asked to send (primarily for tests)
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<SentNotification>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far
    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

impl NotificationSink for RecordingSink {
    async fn notify(
        &self,
        recipient: &UserId,
        category: NotificationCategory,
        summary: &str,
    ) -> Result<()> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentNotification {
                recipient: *recipient,
                category,
                summary: summary.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_sink_captures_in_order() {
        let sink = RecordingSink::new();
        let first = UserId::new();
        let second = UserId::new();

        sink.notify(&first, NotificationCategory::AutoClose, "one")
            .await
            .unwrap();
        sink.notify(&second, NotificationCategory::EditRequest, "two")
            .await
            .unwrap();

        let sent = sink.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].recipient, first);
        assert_eq!(sent[0].category, NotificationCategory::AutoClose);
        assert_eq!(sent[1].summary, "two");
    }
}
