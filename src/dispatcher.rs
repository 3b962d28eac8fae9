//! Per-session read side: frame → envelope → notification handler or RPC handler.
//!
//! A [`Dispatcher`] owns one session. Dropping it closes the session:
//! the writer task is stopped, both stream halves are released, and any
//! calls still pending are abandoned.

use std::sync::Arc;

use tokio::io::ReadHalf;
use tokio::task::JoinHandle;

use crate::codec::{Envelope, EnvelopeKind};
use crate::error::{NotifyError, Result};
use crate::events::NotificationHandler;
use crate::protocol::FrameReader;
use crate::session::{SessionFailures, SharedSession};
use crate::transport::BoxedStream;

/// Reads and routes the units of one session.
pub struct Dispatcher {
    reader: FrameReader<ReadHalf<BoxedStream>>,
    shared: Arc<SharedSession>,
    notifications: Arc<dyn NotificationHandler>,
    session: u64,
    failures: SessionFailures,
    writer_task: JoinHandle<Result<()>>,
    writer_finished: bool,
}

impl Dispatcher {
    pub(crate) fn new(
        reader: FrameReader<ReadHalf<BoxedStream>>,
        shared: Arc<SharedSession>,
        notifications: Arc<dyn NotificationHandler>,
        session: u64,
        failures: SessionFailures,
        writer_task: JoinHandle<Result<()>>,
    ) -> Self {
        Self {
            reader,
            shared,
            notifications,
            session,
            failures,
            writer_task,
            writer_finished: false,
        }
    }

    /// Session generation this dispatcher serves.
    pub fn session(&self) -> u64 {
        self.session
    }

    /// Read one unit and route it.
    ///
    /// # Errors
    ///
    /// - [`NotifyError::Disconnected`] if the server closed the stream
    /// - [`NotifyError::Serialization`] if a caller's RPC arguments could not
    ///   be serialized during this session
    /// - any other variant for a failure that must end the session
    pub async fn process_one(&mut self) -> Result<()> {
        let payload = tokio::select! {
            payload = self.reader.next_payload() => payload?,
            Some(failure) = self.failures.recv() => return Err(failure),
            finished = &mut self.writer_task, if !self.writer_finished => {
                self.writer_finished = true;
                return Err(writer_failure(finished));
            }
        };

        tracing::debug!(len = payload.len(), "Processing unit");
        let envelope = Envelope::decode(&payload)?;
        self.dispatch(envelope)
    }

    fn dispatch(&self, envelope: Envelope) -> Result<()> {
        match envelope.kind {
            EnvelopeKind::Notification => {
                let notification = envelope.into_notification()?;
                tracing::debug!(kind = ?notification.kind(), "Notification received");
                self.notifications.handle_notification(notification);
                Ok(())
            }

            EnvelopeKind::RpcResult => {
                let result = envelope.into_rpc_result()?;
                let handler = self.shared.resolve(result.id)?;
                tracing::debug!(id = result.id, method = handler.method(), "RPC result received");
                handler.receive_result(result);
                Ok(())
            }

            EnvelopeKind::Error => Err(NotifyError::protocol(format!(
                "a protocol error occurred: {}",
                envelope.data_text()
            ))),

            EnvelopeKind::Rpc => Err(NotifyError::protocol(
                "unexpected rpc envelope sent by the server",
            )),
        }
    }

    /// Close the session. Equivalent to dropping the dispatcher.
    pub fn close(self) {}
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.writer_task.abort();
        self.shared.end(self.session);
        tracing::debug!(session = self.session, "Session closed");
    }
}

fn writer_failure(finished: std::result::Result<Result<()>, tokio::task::JoinError>) -> NotifyError {
    match finished {
        Ok(Err(e)) => e,
        Ok(Ok(())) => NotifyError::Io(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "writer task stopped",
        )),
        Err(e) => NotifyError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)),
    }
}
