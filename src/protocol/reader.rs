//! Async frame reader over a byte stream.
//!
//! [`FrameReader::next_frame`] returns one payload per call. Frames already
//! sitting in the buffer are returned without touching the stream.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

use super::frame::{DEFAULT_BUFFER_LIMIT, DEFAULT_READ_CHUNK_SIZE};
use super::{Frame, FrameBuffer};
use crate::error::{NotifyError, Result};

/// Reads length-prefixed frames from an async byte stream.
pub struct FrameReader<R> {
    reader: R,
    buffer: FrameBuffer,
    chunk: Vec<u8>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Create a reader with the default buffer limit and chunk size.
    pub fn new(reader: R) -> Self {
        Self::with_limits(reader, DEFAULT_BUFFER_LIMIT, DEFAULT_READ_CHUNK_SIZE)
    }

    /// Create a reader with a custom buffer limit and read chunk size.
    pub fn with_limits(reader: R, buffer_limit: usize, read_chunk_size: usize) -> Self {
        Self {
            reader,
            buffer: FrameBuffer::with_limit(buffer_limit),
            chunk: vec![0u8; read_chunk_size.max(1)],
        }
    }

    /// Read the next complete frame.
    ///
    /// # Errors
    ///
    /// - [`NotifyError::Disconnected`] when the stream hits EOF, including a
    ///   truncated close reported as [`io::ErrorKind::UnexpectedEof`]
    /// - [`NotifyError::Io`] when the read itself fails
    /// - [`NotifyError::Protocol`] on buffer overflow or a bad length prefix
    pub async fn next_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = self.buffer.try_extract_one()? {
                tracing::trace!(len = frame.len(), "Frame extracted");
                return Ok(frame);
            }

            let n = match self.reader.read(&mut self.chunk).await {
                Ok(n) => n,
                // TLS peer closed TCP without close_notify
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => 0,
                Err(e) => return Err(e.into()),
            };
            if n == 0 {
                return Err(NotifyError::Disconnected);
            }

            tracing::trace!(bytes = n, buffered = self.buffer.len(), "Read chunk");
            self.buffer.extend(&self.chunk[..n])?;
        }
    }

    /// Read the next frame and decode its payload as text.
    pub async fn next_payload(&mut self) -> Result<String> {
        self.next_frame().await?.into_text()
    }

    /// Number of bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}
