//! # notifywire-client
//!
//! Persistent TLS client for a notification/RPC server speaking a
//! length-prefixed JSON protocol.
//!
//! ## Protocol
//!
//! - **Framing**: `<decimal byte length>:<payload>`, units back-to-back
//! - **Envelope**: `{"type": "notification" | "rpc" | "rpcResult" | "error", "data": {...}}`
//! - **RPC**: client sends `{"id", "method", "params"}`, server answers with
//!   `{"id", "result"}`; ids restart at 1 on every connection
//!
//! ## Architecture
//!
//! - **Read loop**: one task reads frames, pushes notifications to a
//!   [`NotificationHandler`] and routes RPC results to their [`RpcHandler`]
//! - **Writer task**: serializes outbound requests from any number of callers
//! - **Reconnect loop**: [`Client::run`] reconnects forever until shut down
//!
//! ## Example
//!
//! ```no_run
//! use notifywire_client::{Client, Notification};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = Client::builder("notify.example.com", 4443)
//!         .on_notification(|n: Notification| {
//!             if n.kind() == Some("release") {
//!                 println!("new release: {:?}", n.get("name"));
//!             }
//!         })
//!         .build()
//!         .unwrap();
//!
//!     client.run().await;
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod events;
pub mod protocol;
pub mod rpc;
pub mod transport;
pub mod writer;

mod client;
mod dispatcher;
mod session;

pub use client::{Client, ClientBuilder, ConnectionState};
pub use codec::{Notification, RpcResult};
pub use config::ClientConfig;
pub use dispatcher::Dispatcher;
pub use error::{NotifyError, Result};
pub use events::{EventSink, NotificationHandler, TracingEventSink};
pub use rpc::RpcHandler;
