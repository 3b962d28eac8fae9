//! Caller-supplied callbacks: connection events and notifications.
//!
//! Both traits are invoked synchronously on the read loop's task, so
//! implementations should hand off slow work rather than block.

use crate::codec::Notification;
use crate::error::NotifyError;

/// Receives connection lifecycle transitions from the reconnect loop.
///
/// All methods default to doing nothing.
pub trait EventSink: Send + Sync + 'static {
    /// A connection attempt is starting.
    fn connecting(&self) {}

    /// A session was established.
    fn connected(&self) {}

    /// A connection attempt failed; the loop retries after the reconnect delay.
    fn connection_error(&self, _cause: &std::io::Error) {}

    /// The server closed the session cleanly.
    fn disconnected(&self) {}

    /// The session was torn down because of a protocol or I/O failure.
    fn critical_error(&self, _error: &NotifyError) {}
}

/// [`EventSink`] that reports every transition through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn connecting(&self) {
        tracing::info!("Connecting to notification server");
    }

    fn connected(&self) {
        tracing::info!("Connected to notification server");
    }

    fn connection_error(&self, cause: &std::io::Error) {
        tracing::warn!(error = %cause, "Unable to connect to notification server");
    }

    fn disconnected(&self) {
        tracing::info!("Notification server closed the connection");
    }

    fn critical_error(&self, error: &NotifyError) {
        tracing::error!(error = %error, "Critical notification protocol error");
    }
}

/// Receives server-pushed notifications.
///
/// Implemented for any `Fn(Notification)` closure.
pub trait NotificationHandler: Send + Sync + 'static {
    /// Handle one notification.
    fn handle_notification(&self, notification: Notification);
}

impl<F> NotificationHandler for F
where
    F: Fn(Notification) + Send + Sync + 'static,
{
    fn handle_notification(&self, notification: Notification) {
        self(notification)
    }
}

/// Notification handler that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifications;

impl NotificationHandler for LogNotifications {
    fn handle_notification(&self, notification: Notification) {
        tracing::info!(kind = ?notification.kind(), "Unhandled notification");
    }
}
