//! # Notifications
//!
//! User-facing messages emitted by the wallet session and the settlement orchestrator.
//! Rendering (toasts, status bar) happens elsewhere; this module only hands messages off.
//!
//! Two [`Notifier`] implementations ship with the crate:
//! - [`TracingNotifier`]: writes each notification to the log
//! - [`ChannelNotifier`]: queues notifications on an unbounded channel for a UI to drain

use serde::Serialize;
use tracing::{error, info, warn};

use crate::core::service::Notifier;

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

/// A single user message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub message: String,
    pub description: String,
    pub kind: NotificationKind,
}

impl Notification {
    pub fn new(message: impl Into<String>, description: impl Into<String>, kind: NotificationKind) -> Self {
        Self {
            message: message.into(),
            description: description.into(),
            kind,
        }
    }

    pub fn info(message: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(message, description, NotificationKind::Info)
    }

    pub fn error(message: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(message, description, NotificationKind::Error)
    }
}

/// Logs notifications through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, n: Notification) {
        match n.kind {
            NotificationKind::Info | NotificationKind::Success => {
                info!(description = %n.description, "{}", n.message)
            }
            NotificationKind::Warning => warn!(description = %n.description, "{}", n.message),
            NotificationKind::Error => error!(description = %n.description, "{}", n.message),
        }
    }
}

/// Queues notifications for a consumer such as a toast widget.
///
/// The channel is unbounded so `notify` never waits. Once every receiver is gone the
/// notification is dropped with a debug log.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: async_channel::Sender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, async_channel::Receiver<Notification>) {
        let (tx, rx) = async_channel::unbounded();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        if let Err(e) = self.tx.try_send(notification) {
            tracing::debug!(message = %e.into_inner().message, "Notification dropped, no receiver");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_notifier_queues_in_order() {
        let (notifier, rx) = ChannelNotifier::new();
        notifier.notify(Notification::info("Wallet update", "Disconnected from wallet"));
        notifier.notify(Notification::error("Error settling funds", "Markets not connected"));

        assert_eq!(rx.try_recv().map(|n| n.kind), Ok(NotificationKind::Info));
        let second = rx.try_recv().expect("second notification");
        assert_eq!(second.description, "Markets not connected");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_notifier_without_receiver_does_not_panic() {
        let (notifier, rx) = ChannelNotifier::new();
        drop(rx);
        notifier.notify(Notification::info("Wallet update", "Connected to wallet abc"));
    }

    #[test]
    fn test_notification_serializes_kind_lowercase() {
        let n = Notification::error("Error settling funds", "Wallet not connected");
        let json = serde_json::to_value(&n).expect("serialize");
        assert_eq!(json["kind"], "error");
    }
}
