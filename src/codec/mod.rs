//! Codec module - JSON envelopes carried inside frames.
//!
//! - [`JsonCodec`] - serde_json encode/decode with protocol-aware errors
//! - [`Envelope`] - `{"type": ..., "data": ...}` with lazily decoded data
//! - [`Notification`], [`RpcResult`] - typed views over envelope data
//!
//! # Example
//!
//! ```
//! use notifywire_client::codec::{Envelope, EnvelopeKind, JsonCodec};
//!
//! let payload = JsonCodec::encode_rpc_request(1, "status", &["all"]).unwrap();
//! assert_eq!(
//!     payload,
//!     r#"{"type":"rpc","data":{"id":1,"method":"status","params":["all"]}}"#
//! );
//!
//! let envelope = Envelope::decode(r#"{"type":"rpcResult","data":{"id":1,"result":true}}"#).unwrap();
//! assert_eq!(envelope.kind, EnvelopeKind::RpcResult);
//! ```

mod envelope;
mod json;

pub use envelope::{Envelope, EnvelopeKind, Notification, RpcRequest, RpcResult};
pub use json::JsonCodec;
