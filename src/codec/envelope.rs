//! Envelope types.
//!
//! Every payload is `{"type": <kind>, "data": <object>}`. The envelope is
//! decoded first with `data` kept as a raw [`serde_json::Value`]; the
//! kind-specific view ([`Notification`], [`RpcResult`]) is built on demand.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::JsonCodec;
use crate::error::{NotifyError, Result};

/// Envelope discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnvelopeKind {
    /// Server-pushed notification.
    Notification,
    /// Client-issued RPC request.
    Rpc,
    /// Server response to an RPC request.
    RpcResult,
    /// Server-reported protocol error.
    Error,
}

impl EnvelopeKind {
    /// Wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Notification => "notification",
            Self::Rpc => "rpc",
            Self::RpcResult => "rpcResult",
            Self::Error => "error",
        }
    }
}

/// A decoded inbound envelope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Envelope {
    /// Envelope kind (`type` on the wire).
    #[serde(rename = "type")]
    pub kind: EnvelopeKind,
    /// Raw envelope data.
    pub data: Value,
}

impl Envelope {
    /// Decode an envelope from payload text.
    ///
    /// # Errors
    ///
    /// Returns a protocol error for malformed JSON, a missing `type` or
    /// `data` field, or an unrecognized `type`.
    pub fn decode(payload: &str) -> Result<Self> {
        JsonCodec::decode(payload)
    }

    /// Interpret the data as a notification.
    pub fn into_notification(self) -> Result<Notification> {
        Notification::from_value(self.data)
    }

    /// Interpret the data as an RPC result.
    pub fn into_rpc_result(self) -> Result<RpcResult> {
        JsonCodec::decode_value(self.data)
    }

    /// Render the data as text (used for server `error` envelopes).
    pub fn data_text(&self) -> String {
        self.data.to_string()
    }
}

/// Outgoing envelope, borrowing its data.
#[derive(Debug, Serialize)]
pub(crate) struct OutgoingEnvelope<T> {
    #[serde(rename = "type")]
    pub kind: EnvelopeKind,
    pub data: T,
}

/// Data of an outgoing `rpc` envelope.
#[derive(Debug, Serialize)]
pub struct RpcRequest<'a, P> {
    /// Call identifier, unique within the session.
    pub id: u64,
    /// Remote method name.
    pub method: &'a str,
    /// Positional parameters.
    pub params: &'a [P],
}

/// Data of an inbound `rpcResult` envelope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RpcResult {
    /// Identifier of the call this result answers.
    pub id: u64,
    /// Method result.
    pub result: Value,
    /// Auxiliary fields (status, result kind, ...) passed through to the handler.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RpcResult {
    /// Decode the result into a typed value.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        JsonCodec::decode_value(self.result.clone())
    }

    /// Look up an auxiliary field such as `status`.
    pub fn aux(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

/// A server-pushed notification.
///
/// The payload is opaque to the protocol; use [`kind`](Self::kind) to
/// route it and [`decode`](Self::decode) to turn it into a domain type.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    data: Map<String, Value>,
}

impl Notification {
    /// Build a notification from envelope data, which must be an object.
    pub fn from_value(data: Value) -> Result<Self> {
        match data {
            Value::Object(data) => Ok(Self { data }),
            other => Err(NotifyError::protocol(format!(
                "notification data must be an object, got {other}"
            ))),
        }
    }

    /// The `kind` field, if present (e.g. `"release"`).
    pub fn kind(&self) -> Option<&str> {
        self.data.get("kind").and_then(Value::as_str)
    }

    /// Look up a single field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Raw notification data.
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Decode the notification into a domain type.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        JsonCodec::decode_value(Value::Object(self.data.clone()))
    }

    /// Consume into the raw JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.data)
    }
}
