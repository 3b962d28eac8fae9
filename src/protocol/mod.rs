//! Protocol module - wire format, framing, and frame reading.
//!
//! Every unit on the wire is `<decimal length>:<payload>` where the payload
//! is exactly `length` bytes of UTF-8 JSON text. Units are concatenated
//! back-to-back with no other delimiter.
//!
//! - [`FrameBuffer`] accumulates partial reads and extracts complete frames
//! - [`FrameReader`] drives a `FrameBuffer` from an async byte stream
//! - [`encode_frame`] builds the wire form for outgoing payloads

mod frame;
mod frame_buffer;
mod reader;

pub use frame::{
    encode_frame, parse_declared_length, Frame, OutboundFrame, DEFAULT_BUFFER_LIMIT,
    DEFAULT_READ_CHUNK_SIZE, LENGTH_SEPARATOR,
};
pub use frame_buffer::FrameBuffer;
pub use reader::FrameReader;
