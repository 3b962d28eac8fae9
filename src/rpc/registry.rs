//! Registry of outstanding RPC calls.
//!
//! Ids are allocated sequentially starting from 1 and restart at 1 whenever
//! a new session begins. Results are matched by id; a result for an id that
//! is not pending means the server is out of sync with this client.
//!
//! The registry itself is not synchronized. The client keeps it behind the
//! same lock as the current session's writer (see `client.rs`).
//!
//! # Example
//!
//! ```
//! use notifywire_client::rpc::{ResultSender, RpcRegistry};
//!
//! let mut registry = RpcRegistry::new();
//! registry.reset();
//!
//! let (handler, _rx) = ResultSender::new("status");
//! let id = registry.next_id();
//! registry.register(id, Box::new(handler));
//!
//! assert_eq!(id, 1);
//! assert!(registry.resolve(1).is_ok());
//! assert!(registry.resolve(1).is_err());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use super::RpcHandler;
use crate::error::{NotifyError, Result};

/// An issued call awaiting its result.
pub struct PendingCall {
    id: u64,
    session: u64,
    issued_at: Instant,
    handler: Box<dyn RpcHandler>,
}

impl PendingCall {
    /// Call identifier.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Session the call was issued in.
    pub fn session(&self) -> u64 {
        self.session
    }

    /// Remote method name.
    pub fn method(&self) -> &str {
        self.handler.method()
    }

    /// When the call was registered.
    pub fn issued_at(&self) -> Instant {
        self.issued_at
    }

    /// Take the handler out of the pending entry.
    pub fn into_handler(self) -> Box<dyn RpcHandler> {
        self.handler
    }
}

impl fmt::Debug for PendingCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCall")
            .field("id", &self.id)
            .field("session", &self.session)
            .field("method", &self.method())
            .finish()
    }
}

/// Tracks pending calls for the current session.
#[derive(Debug)]
pub struct RpcRegistry {
    /// Current session generation (0 = no session started yet).
    session: u64,
    /// Next call id to assign.
    next_id: u64,
    /// Pending calls by id.
    pending: HashMap<u64, PendingCall>,
}

impl RpcRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            session: 0,
            next_id: 1,
            pending: HashMap::new(),
        }
    }

    /// Start a new session scope.
    ///
    /// Restarts id numbering at 1 and returns every call still pending
    /// from the previous session, ordered by id.
    pub fn reset(&mut self) -> Vec<PendingCall> {
        self.session += 1;
        self.next_id = 1;
        self.drain()
    }

    /// Remove every pending call without starting a new session.
    pub fn drain(&mut self) -> Vec<PendingCall> {
        let mut calls: Vec<PendingCall> = self.pending.drain().map(|(_, call)| call).collect();
        calls.sort_by_key(PendingCall::id);
        calls
    }

    /// Current session generation.
    #[inline]
    pub fn session(&self) -> u64 {
        self.session
    }

    /// The id the next call will receive.
    #[inline]
    pub fn peek_id(&self) -> u64 {
        self.next_id
    }

    /// Return the current id and advance the counter.
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Store a pending call under `id`.
    pub fn register(&mut self, id: u64, handler: Box<dyn RpcHandler>) {
        let call = PendingCall {
            id,
            session: self.session,
            issued_at: Instant::now(),
            handler,
        };
        if let Some(previous) = self.pending.insert(id, call) {
            tracing::warn!(id, method = previous.method(), "Replaced pending RPC call with same id");
        }
    }

    /// Remove and return the handler for `id`.
    ///
    /// # Errors
    ///
    /// Returns a protocol error if `id` is not pending.
    pub fn resolve(&mut self, id: u64) -> Result<Box<dyn RpcHandler>> {
        self.pending
            .remove(&id)
            .map(PendingCall::into_handler)
            .ok_or_else(|| NotifyError::protocol(format!("invalid RPC result ID: {id}")))
    }

    /// Withdraw a call whose request never made it onto the wire.
    ///
    /// Does nothing if the registry has moved on to another session.
    pub fn cancel(&mut self, session: u64, id: u64) -> Option<PendingCall> {
        if session != self.session {
            return None;
        }
        self.pending.remove(&id)
    }

    /// Check whether `id` is pending.
    pub fn contains(&self, id: u64) -> bool {
        self.pending.contains_key(&id)
    }

    /// Number of pending calls.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check if no calls are pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Default for RpcRegistry {
    fn default() -> Self {
        Self::new()
    }
}
