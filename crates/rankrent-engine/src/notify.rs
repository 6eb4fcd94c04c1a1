//! User-facing notices raised during a search.

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Informational.
    Info,
    /// Something the user should act on.
    Warning,
    /// The operation failed.
    Error,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Human-readable text.
    pub message: String,
}

impl Notice {
    /// Informational notice.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    /// Warning notice.
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    /// Error notice.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Sink for notices.
pub trait Notifier: Send + Sync {
    /// Deliver one notice.
    fn notify(&self, notice: Notice);
}

impl<T: Notifier + ?Sized> Notifier for &T {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice);
    }
}

/// Delivers every notice to both sinks.
impl<A: Notifier, B: Notifier> Notifier for (A, B) {
    fn notify(&self, notice: Notice) {
        self.0.notify(notice.clone());
        self.1.notify(notice);
    }
}

/// Collects notices for a single request.
#[derive(Debug, Default)]
pub struct NoticeBuffer {
    notices: Mutex<Vec<Notice>>,
}

impl NoticeBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the collected notices.
    #[must_use]
    pub fn take(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Notifier for NoticeBuffer {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}

/// Writes notices to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => tracing::info!(notice = %notice.message, "Search notice"),
            NoticeLevel::Warning => tracing::warn!(notice = %notice.message, "Search notice"),
            NoticeLevel::Error => tracing::error!(notice = %notice.message, "Search notice"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_drains_in_order() {
        let buffer = NoticeBuffer::new();
        buffer.notify(Notice::info("one"));
        buffer.notify(Notice::warning("two"));

        let notices = buffer.take();
        assert_eq!(notices, vec![Notice::info("one"), Notice::warning("two")]);
        assert!(buffer.take().is_empty());
    }

    #[test]
    fn pair_fans_out() {
        let first = NoticeBuffer::new();
        let second = NoticeBuffer::new();
        (&first, &second).notify(Notice::error("boom"));

        assert_eq!(first.take(), vec![Notice::error("boom")]);
        assert_eq!(second.take(), vec![Notice::error("boom")]);
    }

    #[test]
    fn level_serializes_lowercase() {
        let json = serde_json::to_value(Notice::warning("low balance")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "level": "warning", "message": "low balance" })
        );
    }
}
