//! Delivery of user-facing notifications.

use tokio::sync::mpsc;

use armin_core::error::ArminError;
use armin_core::notification::Notification;

/// Sending half of the notification channel.
///
/// Cloned into every component that can fail on the user's behalf. Sending
/// never blocks and never fails; notifications are dropped once the
/// presentation layer has gone away.
#[derive(Clone, Debug)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    /// Creates a notifier and the receiver the presentation layer drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn notify(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            tracing::debug!("[Notifier] Receiver dropped, notification discarded");
        }
    }

    pub fn error(&self, message: impl Into<String>) {
        self.notify(Notification::error(message));
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.notify(Notification::warning(message));
    }

    pub fn info(&self, message: impl Into<String>) {
        self.notify(Notification::info(message));
    }

    pub fn success(&self, message: impl Into<String>) {
        self.notify(Notification::success(message));
    }

    /// Publishes the user-facing text of `err` at error level.
    pub fn report(&self, err: &ArminError) {
        self.error(err.user_message());
    }
}
