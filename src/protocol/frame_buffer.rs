//! Receive buffer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` so appends are amortized O(1) and extracted
//! frames are split off the front without copying.
//! Implements a state machine for handling fragmented frames:
//! - `WaitingForLength`: need a `:` to terminate the decimal length prefix
//! - `WaitingForPayload`: prefix consumed, need N more payload bytes
//!
//! Leftover bytes after a frame stay in the buffer and seed the next one.
//!
//! # Example
//!
//! ```
//! use notifywire_client::protocol::FrameBuffer;
//!
//! let mut buffer = FrameBuffer::new();
//!
//! let frames = buffer.push(b"5:hello6:world!").unwrap();
//! assert_eq!(frames.len(), 2);
//! assert_eq!(frames[0].payload(), b"hello");
//! assert_eq!(frames[1].payload(), b"world!");
//! ```

use bytes::BytesMut;

use super::frame::{parse_declared_length, Frame, DEFAULT_BUFFER_LIMIT, LENGTH_SEPARATOR};
use crate::error::{NotifyError, Result};

/// State machine for frame parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Waiting for the `<length>:` prefix to complete.
    WaitingForLength,
    /// Prefix consumed, waiting for `remaining` payload bytes.
    WaitingForPayload { remaining: usize },
}

/// Buffer for accumulating incoming bytes and extracting complete frames.
///
/// The buffered length never reaches `buffer_limit`: an append that would
/// take it there fails with a protocol error instead.
#[derive(Debug)]
pub struct FrameBuffer {
    /// Accumulated bytes from socket reads.
    buffer: BytesMut,
    /// Current parsing state.
    state: State,
    /// Exclusive upper bound on buffered bytes and declared frame lengths.
    buffer_limit: usize,
}

impl FrameBuffer {
    /// Create a new frame buffer with the default limit.
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_BUFFER_LIMIT)
    }

    /// Create a new frame buffer with a custom limit.
    pub fn with_limit(buffer_limit: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(buffer_limit.min(64 * 1024)),
            state: State::WaitingForLength,
            buffer_limit,
        }
    }

    /// Maximum buffered bytes (exclusive).
    #[inline]
    pub fn limit(&self) -> usize {
        self.buffer_limit
    }

    /// Append data to the buffer without extracting frames.
    ///
    /// # Errors
    ///
    /// Returns a protocol error if the buffer reaches its limit. The check
    /// covers every append, whether a length prefix or a payload is pending.
    pub fn extend(&mut self, data: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(data);

        if self.buffer.len() >= self.buffer_limit {
            return Err(NotifyError::protocol(format!(
                "the buffer has exceeded the limit ({} >= {} bytes)",
                self.buffer.len(),
                self.buffer_limit
            )));
        }

        Ok(())
    }

    /// Push data into the buffer and extract all complete frames.
    ///
    /// Returns an empty vector if the data only completes part of a frame.
    ///
    /// # Errors
    ///
    /// Returns error on buffer overflow, a malformed length prefix, or a
    /// declared length that could never fit.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Frame>> {
        self.extend(data)?;

        let mut frames = Vec::new();
        while let Some(frame) = self.try_extract_one()? {
            frames.push(frame);
        }

        Ok(frames)
    }

    /// Try to extract a single frame from the buffer.
    ///
    /// Returns:
    /// - `Ok(Some(frame))` if a complete frame was extracted
    /// - `Ok(None)` if more data is needed
    /// - `Err(...)` on a protocol violation
    pub fn try_extract_one(&mut self) -> Result<Option<Frame>> {
        loop {
            match self.state {
                State::WaitingForLength => {
                    let Some(offset) = self.buffer.iter().position(|&b| b == LENGTH_SEPARATOR)
                    else {
                        return Ok(None);
                    };

                    let length = parse_declared_length(&self.buffer[..offset], self.buffer_limit)?;

                    // Consume "<length>:"
                    let _ = self.buffer.split_to(offset + 1);
                    self.state = State::WaitingForPayload { remaining: length };
                }

                State::WaitingForPayload { remaining } => {
                    if self.buffer.len() < remaining {
                        return Ok(None);
                    }

                    let payload = self.buffer.split_to(remaining).freeze();
                    self.state = State::WaitingForLength;

                    return Ok(Some(Frame::new(payload)));
                }
            }
        }
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer and reset state.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.state = State::WaitingForLength;
    }

    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match self.state {
            State::WaitingForLength => "WaitingForLength",
            State::WaitingForPayload { .. } => "WaitingForPayload",
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::encode_frame;

    #[test]
    fn test_single_complete_frame() {
        let mut buffer = FrameBuffer::new();

        let frames = buffer.push(b"5:hello").unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), b"hello");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_leftover_seeds_next_frame() {
        let mut buffer = FrameBuffer::new();

        let frames = buffer.push(b"5:hello6:world!").unwrap();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].payload(), b"hello");
        assert_eq!(frames[1].payload(), b"world!");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_fragmented_payload() {
        let mut buffer = FrameBuffer::new();

        let frames = buffer.push(b"5:hel").unwrap();
        assert!(frames.is_empty());
        assert_eq!(buffer.state_name(), "WaitingForPayload");

        let frames = buffer.push(b"lo").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), b"hello");
    }

    #[test]
    fn test_fragmented_length_prefix() {
        let mut buffer = FrameBuffer::new();

        assert!(buffer.push(b"1").unwrap().is_empty());
        assert_eq!(buffer.state_name(), "WaitingForLength");
        assert!(buffer.push(b"2").unwrap().is_empty());

        let frames = buffer.push(b":hello world!").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), b"hello world!");
    }

    #[test]
    fn test_empty_payload() {
        let mut buffer = FrameBuffer::new();

        let frames = buffer.push(b"0:").unwrap();

        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_empty());
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut buffer = FrameBuffer::new();
        let wire = encode_frame(br#"{"type":"notification","data":{}}"#);

        let mut all_frames = Vec::new();
        for byte in wire.iter() {
            all_frames.extend(buffer.push(&[*byte]).unwrap());
        }

        assert_eq!(all_frames.len(), 1);
        assert_eq!(
            all_frames[0].payload(),
            br#"{"type":"notification","data":{}}"#
        );
    }

    #[test]
    fn test_mixed_complete_and_partial() {
        let mut buffer = FrameBuffer::new();

        let frames = buffer.push(b"5:first6:sec").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), b"first");
        assert_eq!(buffer.len(), 3);

        let frames = buffer.push(b"ond").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), b"second");
    }

    #[test]
    fn test_buffer_limit_reached() {
        let mut buffer = FrameBuffer::with_limit(16);

        // No separator: everything stays buffered
        let result = buffer.push(&[b'1'; 16]);

        let err = result.unwrap_err();
        assert!(err.to_string().contains("exceeded the limit"));
    }

    #[test]
    fn test_buffer_one_below_limit_ok() {
        let mut buffer = FrameBuffer::with_limit(16);

        let frames = buffer.push(&[b'1'; 15]).unwrap();

        assert!(frames.is_empty());
        assert_eq!(buffer.len(), 15);
    }

    #[test]
    fn test_limit_applies_to_buffered_bytes_in_payload_phase() {
        // 13-byte unit plus the start of the next one, in a single read
        let mut buffer = FrameBuffer::with_limit(16);
        let err = buffer.push(b"10:01234567893:abc").unwrap_err();
        assert!(err.to_string().contains("exceeded the limit"));

        // Same bytes with the prefix already consumed stay under the limit
        let mut buffer = FrameBuffer::with_limit(16);
        assert!(buffer.push(b"10:").unwrap().is_empty());
        let frames = buffer.push(b"01234567893:abc").unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].payload(), b"0123456789");
        assert_eq!(frames[1].payload(), b"abc");
    }

    #[test]
    fn test_oversized_declared_length() {
        let mut buffer = FrameBuffer::with_limit(100);

        let err = buffer.push(b"100:").unwrap_err();

        assert!(err.to_string().contains("exceeds buffer limit"));
    }

    #[test]
    fn test_malformed_length() {
        let mut buffer = FrameBuffer::new();

        let err = buffer.push(b"abc:xyz").unwrap_err();

        assert!(matches!(err, NotifyError::Protocol(_)));
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn test_clear_resets_state() {
        let mut buffer = FrameBuffer::new();
        buffer.push(b"10:abc").unwrap();
        assert_eq!(buffer.state_name(), "WaitingForPayload");

        buffer.clear();

        assert_eq!(buffer.state_name(), "WaitingForLength");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_try_extract_without_reading() {
        let mut buffer = FrameBuffer::new();
        buffer.extend(b"2:ab2:cd").unwrap();

        assert_eq!(buffer.try_extract_one().unwrap().unwrap().payload(), b"ab");
        assert_eq!(buffer.try_extract_one().unwrap().unwrap().payload(), b"cd");
        assert!(buffer.try_extract_one().unwrap().is_none());
    }
}
