//! Session start/end announcements.

pub mod formatter;

pub use formatter::AnnouncementFormatter;

use tokio::sync::mpsc;

use crate::common::error::NotifyError;
use crate::common::messages::Notification;

/// Receives human-facing lifecycle announcements.
///
/// Implementations must not block; a failure never rolls back the
/// lifecycle transition that produced the notification.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Notifier that forwards announcements to the Discord event loop.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        self.tx.send(notification).map_err(|_| NotifyError::Closed)
    }
}
