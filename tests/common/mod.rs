//! Shared helpers: a scripted in-memory connector and a recording event sink.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use notifywire_client::protocol::{encode_frame, FrameReader};
use notifywire_client::transport::{BoxFuture, BoxedStream, Connector};
use notifywire_client::{EventSink, NotifyError};
use parking_lot::Mutex;
use tokio::io::{duplex, AsyncWriteExt, DuplexStream};
use tokio::sync::mpsc;

/// What the next connection attempt does.
#[derive(Debug, Clone, Copy)]
pub enum Attempt {
    Accept,
    Refuse,
}

/// Connector handing out in-memory streams; the server ends arrive on a channel.
pub struct ScriptedConnector {
    script: Mutex<VecDeque<Attempt>>,
    servers: mpsc::UnboundedSender<DuplexStream>,
    attempts: Arc<AtomicUsize>,
}

impl ScriptedConnector {
    pub fn new(script: impl IntoIterator<Item = Attempt>) -> (Self, mpsc::UnboundedReceiver<DuplexStream>) {
        let (servers, rx) = mpsc::unbounded_channel();
        (
            Self {
                script: Mutex::new(script.into_iter().collect()),
                servers,
                attempts: Arc::new(AtomicUsize::new(0)),
            },
            rx,
        )
    }

    pub fn attempts(&self) -> Arc<AtomicUsize> {
        self.attempts.clone()
    }
}

impl Connector for ScriptedConnector {
    fn connect<'a>(&'a self, _address: &'a str, _port: u16) -> BoxFuture<'a, io::Result<BoxedStream>> {
        Box::pin(async move {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let attempt = self.script.lock().pop_front().unwrap_or(Attempt::Accept);
            match attempt {
                Attempt::Refuse => Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused")),
                Attempt::Accept => {
                    let (client, server) = duplex(64 * 1024);
                    let _ = self.servers.send(server);
                    Ok(Box::new(client) as BoxedStream)
                }
            }
        })
    }
}

/// Connection events in the order the client reported them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connecting,
    Connected,
    ConnectionError,
    Disconnected,
    Critical(String),
}

pub struct RecordingSink {
    tx: mpsc::UnboundedSender<Event>,
}

impl RecordingSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for RecordingSink {
    fn connecting(&self) {
        let _ = self.tx.send(Event::Connecting);
    }

    fn connected(&self) {
        let _ = self.tx.send(Event::Connected);
    }

    fn connection_error(&self, _cause: &io::Error) {
        let _ = self.tx.send(Event::ConnectionError);
    }

    fn disconnected(&self) {
        let _ = self.tx.send(Event::Disconnected);
    }

    fn critical_error(&self, error: &NotifyError) {
        let _ = self.tx.send(Event::Critical(error.to_string()));
    }
}

/// Server side of one session.
pub struct FakeServer {
    reader: FrameReader<tokio::io::ReadHalf<DuplexStream>>,
    writer: tokio::io::WriteHalf<DuplexStream>,
}

impl FakeServer {
    pub fn new(stream: DuplexStream) -> Self {
        let (read_half, writer) = tokio::io::split(stream);
        Self {
            reader: FrameReader::new(read_half),
            writer,
        }
    }

    /// Send one framed payload.
    pub async fn send(&mut self, payload: &str) {
        self.writer.write_all(&encode_frame(payload.as_bytes())).await.unwrap();
    }

    /// Send raw bytes with no framing.
    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
    }

    /// Receive one request sent by the client, as JSON.
    pub async fn recv(&mut self) -> serde_json::Value {
        let payload = self.reader.next_payload().await.unwrap();
        serde_json::from_str(&payload).unwrap()
    }

    /// Wait until the client closes its side.
    pub async fn expect_closed(&mut self) {
        assert!(matches!(
            self.reader.next_payload().await,
            Err(NotifyError::Disconnected)
        ));
    }
}

pub async fn next_event(rx: &mut mpsc::UnboundedReceiver<Event>) -> Event {
    rx.recv().await.expect("event sink closed")
}
