//! Session-scoped state shared between the read loop and RPC callers.
//!
//! The current writer handle and the RPC registry live behind one lock so
//! that id allocation, registration and the choice of writer happen
//! atomically. The lock is never held across an `.await`.
//!
//! Failures detected on the caller side of a session (an RPC whose
//! arguments cannot be serialized) are reported to the session's read loop
//! through a failure channel, so they end the session like any other
//! critical error.

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::codec::JsonCodec;
use crate::error::{NotifyError, Result};
use crate::protocol::OutboundFrame;
use crate::rpc::{PendingCall, RpcHandler, RpcRegistry};
use crate::writer::WriterHandle;

/// A registered call whose frame still has to be queued.
pub(crate) struct Submission {
    pub session: u64,
    pub id: u64,
    pub writer: WriterHandle,
    pub frame: OutboundFrame,
}

/// Receiving end of a session's failure channel.
pub(crate) type SessionFailures = mpsc::UnboundedReceiver<NotifyError>;

struct Slot {
    writer: Option<WriterHandle>,
    failures: Option<mpsc::UnboundedSender<NotifyError>>,
    registry: RpcRegistry,
}

pub(crate) struct SharedSession {
    slot: Mutex<Slot>,
}

impl SharedSession {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                writer: None,
                failures: None,
                registry: RpcRegistry::new(),
            }),
        }
    }

    /// Install the writer of a new session and restart id numbering.
    ///
    /// Returns the new session generation and the receiver of its failures.
    pub fn begin(&self, writer: WriterHandle) -> (u64, SessionFailures) {
        let (failures_tx, failures) = mpsc::unbounded_channel();
        let (session, stale) = {
            let mut slot = self.slot.lock();
            let stale = slot.registry.reset();
            slot.writer = Some(writer);
            slot.failures = Some(failures_tx);
            (slot.registry.session(), stale)
        };
        abandon_all(stale);
        (session, failures)
    }

    /// Tear down `session` if it is still current.
    ///
    /// Pending calls are abandoned. Idempotent.
    pub fn end(&self, session: u64) {
        let stale = {
            let mut slot = self.slot.lock();
            if slot.registry.session() != session || slot.writer.is_none() {
                return;
            }
            slot.writer = None;
            slot.failures = None;
            slot.registry.drain()
        };
        abandon_all(stale);
    }

    /// Allocate an id, register `handler` and build its request frame.
    ///
    /// A serialization failure is returned to the caller and also fails the
    /// current session.
    pub fn submit<P: Serialize>(
        &self,
        handler: Box<dyn RpcHandler>,
        params: &[P],
    ) -> Result<Submission> {
        let mut slot = self.slot.lock();
        let writer = slot.writer.clone().ok_or(NotifyError::NotConnected)?;

        // Only consume the id once serialization has succeeded
        let frame = match JsonCodec::rpc_frame(slot.registry.peek_id(), handler.method(), params) {
            Ok(frame) => frame,
            Err(e) => {
                if let Some(failures) = &slot.failures {
                    let _ = failures.send(NotifyError::Serialization(serde::ser::Error::custom(
                        format!("unable to serialise RPC arguments for {}: {e}", handler.method()),
                    )));
                }
                return Err(e);
            }
        };
        let id = slot.registry.next_id();
        slot.registry.register(id, handler);

        Ok(Submission {
            session: slot.registry.session(),
            id,
            writer,
            frame,
        })
    }

    /// Withdraw a call whose frame could not be queued.
    pub fn withdraw(&self, session: u64, id: u64) -> Option<PendingCall> {
        self.slot.lock().registry.cancel(session, id)
    }

    /// Remove and return the handler for an incoming result.
    pub fn resolve(&self, id: u64) -> Result<Box<dyn RpcHandler>> {
        self.slot.lock().registry.resolve(id)
    }

    pub fn is_active(&self) -> bool {
        self.slot.lock().writer.is_some()
    }

    pub fn pending_calls(&self) -> usize {
        self.slot.lock().registry.len()
    }
}

fn abandon_all(calls: Vec<PendingCall>) {
    for call in calls {
        tracing::debug!(
            id = call.id(),
            method = call.method(),
            age_ms = call.issued_at().elapsed().as_millis() as u64,
            "Abandoning pending RPC call"
        );
        call.into_handler().abandon();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::ResultSender;
    use crate::writer::{spawn_writer_task, WriterConfig};
    use tokio::io::duplex;

    fn writer() -> WriterHandle {
        let (client, _server) = duplex(4096);
        spawn_writer_task(client, &WriterConfig::default()).0
    }

    #[tokio::test]
    async fn test_submit_requires_session() {
        let shared = SharedSession::new();
        let (handler, _rx) = ResultSender::new("status");

        let result = shared.submit(Box::new(handler), &[1]);

        assert!(matches!(result, Err(NotifyError::NotConnected)));
    }

    #[tokio::test]
    async fn test_ids_restart_per_session() {
        let shared = SharedSession::new();

        let (first, _f1) = shared.begin(writer());
        let (h1, _r1) = ResultSender::new("a");
        let (h2, _r2) = ResultSender::new("b");
        assert_eq!(shared.submit(Box::new(h1), &[0]).unwrap().id, 1);
        assert_eq!(shared.submit(Box::new(h2), &[0]).unwrap().id, 2);

        shared.end(first);
        let (second, _f2) = shared.begin(writer());
        assert_ne!(first, second);

        let (h3, _r3) = ResultSender::new("c");
        assert_eq!(shared.submit(Box::new(h3), &[0]).unwrap().id, 1);
    }

    #[tokio::test]
    async fn test_end_abandons_pending_calls() {
        let shared = SharedSession::new();
        let (session, _failures) = shared.begin(writer());
        let (handler, rx) = ResultSender::new("status");
        shared.submit(Box::new(handler), &[0]).unwrap();
        assert_eq!(shared.pending_calls(), 1);

        shared.end(session);

        assert!(!shared.is_active());
        assert_eq!(shared.pending_calls(), 0);
        assert!(matches!(rx.await.unwrap(), Err(NotifyError::CallAbandoned)));
    }

    #[tokio::test]
    async fn test_stale_end_is_ignored() {
        let shared = SharedSession::new();
        let (old, _f1) = shared.begin(writer());
        let _current = shared.begin(writer());

        shared.end(old);

        assert!(shared.is_active());
    }

    #[tokio::test]
    async fn test_failed_serialization_keeps_id() {
        use std::collections::HashMap;

        let shared = SharedSession::new();
        let (_session, mut failures) = shared.begin(writer());

        let mut bad = HashMap::new();
        bad.insert(vec![1u8], 1);
        let (h1, _r1) = ResultSender::new("bad");
        assert!(matches!(
            shared.submit(Box::new(h1), &[bad]),
            Err(NotifyError::Serialization(_))
        ));
        assert_eq!(shared.pending_calls(), 0);

        let (h2, _r2) = ResultSender::new("good");
        assert_eq!(shared.submit(Box::new(h2), &[0]).unwrap().id, 1);

        let reported = failures.try_recv().unwrap();
        assert!(matches!(reported, NotifyError::Serialization(_)));
        assert!(reported.to_string().contains("unable to serialise RPC arguments for bad"));
        assert!(failures.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_end_closes_failure_channel() {
        let shared = SharedSession::new();
        let (session, mut failures) = shared.begin(writer());

        shared.end(session);

        assert!(failures.recv().await.is_none());
    }
}
