//! Error types for notifywire-client.

use thiserror::Error;

/// Main error type for all notifywire operations.
///
/// The reconnect driver only distinguishes three classes: [`ConnectFailed`],
/// [`Disconnected`], and everything else (treated as critical).
///
/// [`ConnectFailed`]: NotifyError::ConnectFailed
/// [`Disconnected`]: NotifyError::Disconnected
#[derive(Debug, Error)]
pub enum NotifyError {
    /// TCP connect, server name resolution or TLS handshake failed.
    #[error("Connection failed: {0}")]
    ConnectFailed(#[source] std::io::Error),

    /// The server closed the stream (EOF on read).
    #[error("Connection closed by server")]
    Disconnected,

    /// Protocol violation (bad framing, bad envelope, unknown RPC id, etc.).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// An outgoing request could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error on an established session.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No session is currently established.
    #[error("Not connected")]
    NotConnected,

    /// The session ended before the RPC result arrived.
    #[error("RPC call abandoned: session closed")]
    CallAbandoned,

    /// Backpressure timeout - outbound queue full.
    #[error("Backpressure timeout")]
    BackpressureTimeout,

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl NotifyError {
    /// Build a protocol error from anything displayable.
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// True for a clean remote close, which is retried without delay and
    /// reported as `disconnected` rather than as a critical error.
    #[inline]
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::Disconnected)
    }

    /// True for failures raised while establishing a session.
    #[inline]
    pub fn is_connect_failure(&self) -> bool {
        matches!(self, Self::ConnectFailed(_))
    }
}

/// Result type alias using NotifyError.
pub type Result<T> = std::result::Result<T, NotifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(NotifyError::Disconnected.is_disconnect());
        assert!(!NotifyError::Disconnected.is_connect_failure());

        let connect = NotifyError::ConnectFailed(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        assert!(connect.is_connect_failure());
        assert!(!connect.is_disconnect());

        let protocol = NotifyError::protocol("bad frame");
        assert!(!protocol.is_disconnect());
        assert!(!protocol.is_connect_failure());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            NotifyError::protocol("invalid RPC result ID: 7").to_string(),
            "Protocol error: invalid RPC result ID: 7"
        );
        assert_eq!(
            NotifyError::Disconnected.to_string(),
            "Connection closed by server"
        );
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        let err: NotifyError = io.into();
        assert!(matches!(err, NotifyError::Io(_)));
    }
}
