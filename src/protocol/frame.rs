//! Frame types and the `<length>:<payload>` wire form.
//!
//! # Example
//!
//! ```
//! use notifywire_client::protocol::encode_frame;
//!
//! let wire = encode_frame(b"hello");
//! assert_eq!(&wire[..], b"5:hello");
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{NotifyError, Result};

/// Separator between the decimal length prefix and the payload.
pub const LENGTH_SEPARATOR: u8 = b':';

/// Default size of a single socket read.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 1024;

/// Default receive buffer capacity (1000 read chunks).
///
/// The buffer never grows to this size; reaching it is a fatal protocol error.
pub const DEFAULT_BUFFER_LIMIT: usize = 1000 * DEFAULT_READ_CHUNK_SIZE;

/// A complete inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Payload bytes (exactly the declared length).
    pub payload: Bytes,
}

impl Frame {
    /// Create a frame from its payload.
    pub fn new(payload: Bytes) -> Self {
        Self { payload }
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Declared length of the frame.
    #[inline]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Check if the payload is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Convert the payload to text.
    ///
    /// # Errors
    ///
    /// Returns a protocol error if the payload is not valid UTF-8.
    pub fn into_text(self) -> Result<String> {
        String::from_utf8(self.payload.to_vec())
            .map_err(|e| NotifyError::protocol(format!("frame payload is not valid UTF-8: {e}")))
    }
}

/// A frame ready to be written to the transport.
///
/// Prefix and payload are kept apart so the writer can use vectored writes
/// without copying the payload.
#[derive(Debug, Clone)]
pub struct OutboundFrame {
    /// `"<len>:"` prefix.
    pub prefix: Bytes,
    /// Payload bytes.
    pub payload: Bytes,
}

impl OutboundFrame {
    /// Create an outbound frame for the given payload.
    pub fn new(payload: Bytes) -> Self {
        let prefix = Bytes::from(format!("{}:", payload.len()));
        Self { prefix, payload }
    }

    /// Total size of this frame on the wire.
    #[inline]
    pub fn size(&self) -> usize {
        self.prefix.len() + self.payload.len()
    }

    /// Flatten into contiguous wire bytes.
    pub fn to_bytes(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(self.size());
        out.put_slice(&self.prefix);
        out.put_slice(&self.payload);
        out.freeze()
    }
}

/// Encode a payload into its wire form `"<len>:<payload>"`.
///
/// The length is the payload size in bytes, not characters.
pub fn encode_frame(payload: &[u8]) -> Bytes {
    OutboundFrame::new(Bytes::copy_from_slice(payload)).to_bytes()
}

/// Parse the text before the separator as a declared frame length.
///
/// Only plain ASCII decimal digits are accepted; signs, whitespace and
/// empty prefixes are rejected.
///
/// # Errors
///
/// Returns a protocol error naming the offending prefix if it is not a
/// non-negative decimal integer, or if it is not below `buffer_limit`.
pub fn parse_declared_length(prefix: &[u8], buffer_limit: usize) -> Result<usize> {
    let text = String::from_utf8_lossy(prefix);
    if prefix.is_empty() || !prefix.iter().all(u8::is_ascii_digit) {
        return Err(NotifyError::protocol(format!(
            "invalid unit length string: {text:?}"
        )));
    }

    let length: usize = text.parse().map_err(|_| {
        NotifyError::protocol(format!("invalid unit length string: {text:?}"))
    })?;

    if length >= buffer_limit {
        return Err(NotifyError::protocol(format!(
            "unit size {length} exceeds buffer limit {buffer_limit}"
        )));
    }

    Ok(length)
}
