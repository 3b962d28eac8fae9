//! Handler capability for a single RPC call.

use tokio::sync::oneshot;

use crate::codec::RpcResult;
use crate::error::{NotifyError, Result};

/// Receives the outcome of one RPC call.
///
/// A handler is consumed by exactly one of [`receive_result`] or
/// [`abandon`].
///
/// [`receive_result`]: RpcHandler::receive_result
/// [`abandon`]: RpcHandler::abandon
pub trait RpcHandler: Send + 'static {
    /// Remote method this handler calls.
    fn method(&self) -> &str;

    /// Deliver the server's result.
    fn receive_result(self: Box<Self>, result: RpcResult);

    /// The session ended before a result arrived.
    fn abandon(self: Box<Self>) {}
}

/// Handler that forwards the outcome to a oneshot channel.
///
/// Dropping the receiver is allowed; the result is then discarded.
pub struct ResultSender {
    method: String,
    tx: oneshot::Sender<Result<RpcResult>>,
}

impl ResultSender {
    /// Create a handler and the receiver its outcome arrives on.
    pub fn new(method: impl Into<String>) -> (Self, oneshot::Receiver<Result<RpcResult>>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                method: method.into(),
                tx,
            },
            rx,
        )
    }
}

impl RpcHandler for ResultSender {
    fn method(&self) -> &str {
        &self.method
    }

    fn receive_result(self: Box<Self>, result: RpcResult) {
        let _ = self.tx.send(Ok(result));
    }

    fn abandon(self: Box<Self>) {
        let _ = self.tx.send(Err(NotifyError::CallAbandoned));
    }
}
