//! Transport module - encrypted byte streams to the server.
//!
//! [`Connector`] opens one session stream per call. The production
//! implementation is [`TlsConnector`] (TCP + rustls); tests substitute
//! in-memory streams.

mod tls;

use std::future::Future;
use std::io;
use std::pin::Pin;

use tokio::io::{AsyncRead, AsyncWrite};

pub use tls::TlsConnector;

/// Boxed future returned by [`Connector::connect`].
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A bidirectional byte stream usable as a session transport.
pub trait AsyncStream: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T> AsyncStream for T where T: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

/// Type-erased session stream.
pub type BoxedStream = Box<dyn AsyncStream>;

/// Opens session streams to a fixed server.
pub trait Connector: Send + Sync + 'static {
    /// Establish a stream to `address:port`.
    ///
    /// Socket and handshake failures are reported as I/O errors.
    fn connect<'a>(&'a self, address: &'a str, port: u16) -> BoxFuture<'a, io::Result<BoxedStream>>;
}
