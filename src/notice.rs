//! User-facing notifications for failed operations.
//!
//! Nothing in the sync core is fatal; failures are reported here as
//! human-readable messages the rendering layer can show as a banner.

use std::fmt;
use tokio::sync::broadcast;

/// What went wrong, coarsely
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// A remote call failed; local state was reconciled or left untouched
    Persistence,
    /// An operation named an id the local view does not hold
    Consistency,
    /// The board could not be fetched
    Load,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Broadcast sender for notices
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Notice>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Sends a notice; having no subscribers is fine
    pub fn notify(&self, kind: NoticeKind, message: impl Into<String>) {
        let _ = self.sender.send(Notice::new(kind, message));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(64)
    }
}
