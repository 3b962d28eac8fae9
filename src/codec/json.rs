//! JSON codec using `serde_json`.
//!
//! Decoding failures are protocol errors (the server sent bad data);
//! encoding failures are serialization errors (the caller passed bad data).

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::envelope::{EnvelopeKind, OutgoingEnvelope, RpcRequest};
use crate::error::{NotifyError, Result};
use crate::protocol::OutboundFrame;

/// JSON codec for envelopes and their payloads.
pub struct JsonCodec;

impl JsonCodec {
    /// Encode a value to JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Serialization`] if the value cannot be serialized.
    #[inline]
    pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String> {
        Ok(serde_json::to_string(value)?)
    }

    /// Decode JSON text sent by the server.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Protocol`] if the text is not valid JSON for `T`.
    #[inline]
    pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T> {
        serde_json::from_str(text).map_err(|e| {
            NotifyError::protocol(format!("unable to process JSON data sent by the server: {e}"))
        })
    }

    /// Decode an already-parsed JSON value into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Protocol`] if the value does not match `T`.
    #[inline]
    pub fn decode_value<T: DeserializeOwned>(value: serde_json::Value) -> Result<T> {
        serde_json::from_value(value).map_err(|e| {
            NotifyError::protocol(format!("unable to process JSON data sent by the server: {e}"))
        })
    }

    /// Serialize an RPC request envelope.
    ///
    /// Produces `{"type":"rpc","data":{"id":..,"method":..,"params":[..]}}`.
    pub fn encode_rpc_request<P: Serialize>(id: u64, method: &str, params: &[P]) -> Result<String> {
        let envelope = OutgoingEnvelope {
            kind: EnvelopeKind::Rpc,
            data: RpcRequest { id, method, params },
        };
        Self::encode(&envelope)
    }

    /// Serialize an RPC request straight into an outbound frame.
    pub fn rpc_frame<P: Serialize>(id: u64, method: &str, params: &[P]) -> Result<OutboundFrame> {
        let payload = Self::encode_rpc_request(id, method, params)?;
        Ok(OutboundFrame::new(Bytes::from(payload)))
    }
}
