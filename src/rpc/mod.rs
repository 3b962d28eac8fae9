//! RPC module - call identifiers and response correlation.
//!
//! Provides:
//! - [`RpcHandler`] - receives the result (or abandonment) of one call
//! - [`RpcRegistry`] - allocates ids and tracks pending calls per session
//! - [`ResultSender`] - oneshot-backed handler used by `Client::call`

mod handler;
mod registry;

pub use handler::{ResultSender, RpcHandler};
pub use registry::{PendingCall, RpcRegistry};
