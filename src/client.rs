//! Client builder and reconnect loop.
//!
//! The [`ClientBuilder`] provides a fluent API for configuring the client.
//! The [`Client`] manages the lifecycle:
//! 1. Connect (TCP + TLS) to the configured server
//! 2. Read units and dispatch notifications and RPC results
//! 3. On any failure, close the session and connect again, forever
//!
//! # Example
//!
//! ```no_run
//! use notifywire_client::{Client, Notification};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::builder("notify.example.com", 4443)
//!         .on_notification(|n: Notification| println!("{:?}", n.kind()))
//!         .build()?;
//!
//!     let worker = tokio::spawn({
//!         let client = client.clone();
//!         async move { client.run().await }
//!     });
//!
//!     let result = client.call("getReleases", &[10]).await?;
//!     println!("{}", result.result);
//!
//!     client.shutdown();
//!     worker.await?;
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;

use crate::codec::RpcResult;
use crate::config::ClientConfig;
use crate::dispatcher::Dispatcher;
use crate::error::{NotifyError, Result};
use crate::events::{EventSink, LogNotifications, NotificationHandler, TracingEventSink};
use crate::protocol::FrameReader;
use crate::rpc::{ResultSender, RpcHandler};
use crate::session::SharedSession;
use crate::transport::{Connector, TlsConnector};
use crate::writer::spawn_writer_task;

/// Builder for configuring and creating a [`Client`].
pub struct ClientBuilder {
    config: ClientConfig,
    connector: Option<Box<dyn Connector>>,
    notifications: Arc<dyn NotificationHandler>,
    events: Arc<dyn EventSink>,
}

impl ClientBuilder {
    /// Create a builder for `address:port`.
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self::from_config(ClientConfig::new(address, port))
    }

    /// Create a builder from an existing configuration.
    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            config,
            connector: None,
            notifications: Arc::new(LogNotifications),
            events: Arc::new(TracingEventSink),
        }
    }

    /// Set the handler invoked for every server notification.
    pub fn on_notification<H: NotificationHandler>(mut self, handler: H) -> Self {
        self.notifications = Arc::new(handler);
        self
    }

    /// Set the sink receiving connection events.
    ///
    /// Default: [`TracingEventSink`]
    pub fn event_sink<E: EventSink>(mut self, sink: E) -> Self {
        self.events = Arc::new(sink);
        self
    }

    /// Replace the TLS transport.
    pub fn connector<C: Connector>(mut self, connector: C) -> Self {
        self.connector = Some(Box::new(connector));
        self
    }

    /// Name used for TLS certificate verification.
    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.config.server_name = Some(name.into());
        self
    }

    /// Trust only the certificates in this PEM file.
    pub fn ca_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.ca_file = Some(path.into());
        self
    }

    /// Set the receive buffer limit in bytes.
    ///
    /// Default: 1 024 000
    pub fn buffer_limit(mut self, limit: usize) -> Self {
        self.config.buffer_limit = limit;
        self
    }

    /// Set the size of a single socket read.
    ///
    /// Default: 1024
    pub fn read_chunk_size(mut self, size: usize) -> Self {
        self.config.read_chunk_size = size;
        self
    }

    /// Set the delay after a failed connection attempt.
    ///
    /// Default: 10 seconds
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.config.reconnect_delay_secs = delay.as_secs();
        self
    }

    /// Set the maximum pending outbound frames.
    ///
    /// Default: 1024
    pub fn max_pending_frames(mut self, limit: usize) -> Self {
        self.config.writer.max_pending_frames = limit;
        self
    }

    /// Set the writer channel capacity.
    ///
    /// Default: 256
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.config.writer.channel_capacity = capacity;
        self
    }

    /// Set the backpressure timeout.
    ///
    /// Default: 5 seconds
    pub fn backpressure_timeout(mut self, timeout: Duration) -> Self {
        self.config.writer.backpressure_timeout = timeout;
        self
    }

    /// Validate the configuration and build the client.
    ///
    /// Nothing is connected until [`Client::run`] or [`Client::connect`].
    pub fn build(self) -> Result<Client> {
        self.config.validate()?;

        let connector = match self.connector {
            Some(connector) => connector,
            None => Box::new(TlsConnector::from_client_config(&self.config)?),
        };

        let (shutdown, _) = watch::channel(false);
        let (state, _) = watch::channel(ConnectionState::Disconnected);

        Ok(Client {
            inner: Arc::new(Inner {
                config: self.config,
                connector,
                notifications: self.notifications,
                events: self.events,
                shared: Arc::new(SharedSession::new()),
                state,
                shutdown,
            }),
        })
    }
}

/// Position of the reconnect loop in its connect/serve/retry cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// A connection attempt is in progress.
    Connecting,
    /// A session is established and being served.
    Connected,
    /// No session: not running yet, between attempts, or shut down.
    Disconnected,
}

struct Inner {
    config: ClientConfig,
    connector: Box<dyn Connector>,
    notifications: Arc<dyn NotificationHandler>,
    events: Arc<dyn EventSink>,
    shared: Arc<SharedSession>,
    state: watch::Sender<ConnectionState>,
    shutdown: watch::Sender<bool>,
}

/// A notification/RPC client.
///
/// Cheaply cloneable; clones share the same session and registry.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

impl Client {
    /// Create a new client builder.
    pub fn builder(address: impl Into<String>, port: u16) -> ClientBuilder {
        ClientBuilder::new(address, port)
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Establish one session.
    ///
    /// Restarts RPC id numbering at 1 and abandons calls left over from any
    /// earlier session. The returned [`Dispatcher`] must be driven with
    /// [`Dispatcher::process_one`]; dropping it closes the session.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::ConnectFailed`] on socket or handshake failure.
    pub async fn connect(&self) -> Result<Dispatcher> {
        let config = &self.inner.config;
        let stream = self
            .inner
            .connector
            .connect(&config.address, config.port)
            .await
            .map_err(NotifyError::ConnectFailed)?;

        let (read_half, write_half) = tokio::io::split(stream);
        let (writer, writer_task) = spawn_writer_task(write_half, &config.writer);
        let (session, failures) = self.inner.shared.begin(writer);
        let reader = FrameReader::with_limits(read_half, config.buffer_limit, config.read_chunk_size);

        tracing::info!(address = %config.address, port = config.port, session, "Session established");

        Ok(Dispatcher::new(
            reader,
            self.inner.shared.clone(),
            self.inner.notifications.clone(),
            session,
            failures,
            writer_task,
        ))
    }

    /// Run the reconnect loop until [`shutdown`](Self::shutdown) is called.
    ///
    /// - connect failure: report `connection_error`, wait the reconnect delay, retry
    /// - server closed the stream: report `disconnected`, retry immediately
    /// - any other failure: close the session, report `critical_error`, retry immediately
    pub async fn run(&self) {
        let events = &self.inner.events;
        let delay = self.inner.config.reconnect_delay();
        let mut shutdown = self.inner.shutdown.subscribe();

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.set_state(ConnectionState::Connecting);
            events.connecting();
            let attempt = tokio::select! {
                attempt = self.connect() => attempt,
                _ = stopped(&mut shutdown) => break,
            };

            let mut dispatcher = match attempt {
                Ok(dispatcher) => dispatcher,
                Err(e) => {
                    self.set_state(ConnectionState::Disconnected);
                    match &e {
                        NotifyError::ConnectFailed(cause) => events.connection_error(cause),
                        other => events.critical_error(other),
                    }
                    tracing::debug!(delay_secs = delay.as_secs(), "Waiting before reconnecting");
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => continue,
                        _ = stopped(&mut shutdown) => break,
                    }
                }
            };

            self.set_state(ConnectionState::Connected);
            events.connected();

            let failure = loop {
                tokio::select! {
                    processed = dispatcher.process_one() => {
                        if let Err(e) = processed {
                            break Some(e);
                        }
                    }
                    _ = stopped(&mut shutdown) => break None,
                }
            };

            self.set_state(ConnectionState::Disconnected);
            match failure {
                None => {
                    dispatcher.close();
                    break;
                }
                Some(NotifyError::Disconnected) => {
                    events.disconnected();
                    dispatcher.close();
                }
                Some(e) => {
                    dispatcher.close();
                    events.critical_error(&e);
                }
            }
        }

        self.set_state(ConnectionState::Disconnected);
        tracing::info!("Reconnect loop stopped");
    }

    fn set_state(&self, state: ConnectionState) {
        self.inner.state.send_replace(state);
    }

    /// Signal the reconnect loop to close the session and return.
    pub fn shutdown(&self) {
        self.inner.shutdown.send_replace(true);
    }

    /// Current state of the reconnect loop.
    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    /// Subscribe to reconnect loop state changes.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Whether a session is currently established.
    pub fn is_connected(&self) -> bool {
        self.inner.shared.is_active()
    }

    /// Number of calls awaiting a result in the current session.
    pub fn pending_calls(&self) -> usize {
        self.inner.shared.pending_calls()
    }

    /// Send an RPC request whose outcome is delivered to `handler`.
    ///
    /// Returns the id assigned to the call.
    ///
    /// # Errors
    ///
    /// - [`NotifyError::NotConnected`] if no session is established
    /// - [`NotifyError::Serialization`] if `params` cannot be serialized; this
    ///   also ends the current session with a critical error
    /// - [`NotifyError::BackpressureTimeout`] if the outbound queue stays full
    pub async fn perform_rpc<H, P>(&self, handler: H, params: &[P]) -> Result<u64>
    where
        H: RpcHandler,
        P: Serialize,
    {
        let submission = self.inner.shared.submit(Box::new(handler), params)?;
        let (session, id) = (submission.session, submission.id);
        tracing::debug!(id, session, "Sending RPC request");
        if submission.writer.is_backpressure_active() {
            tracing::debug!(
                id,
                pending = submission.writer.pending_count(),
                "Outbound queue full, waiting for writer"
            );
        }

        if let Err(e) = submission.writer.send(submission.frame).await {
            self.inner.shared.withdraw(session, id);
            return Err(e);
        }

        Ok(id)
    }

    /// Send an RPC request and wait for its result.
    ///
    /// # Errors
    ///
    /// Everything [`perform_rpc`](Self::perform_rpc) returns, plus
    /// [`NotifyError::CallAbandoned`] if the session ends first.
    pub async fn call<P: Serialize>(&self, method: &str, params: &[P]) -> Result<RpcResult> {
        let (handler, rx) = ResultSender::new(method);
        self.perform_rpc(handler, params).await?;
        rx.await.map_err(|_| NotifyError::CallAbandoned)?
    }
}

async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    // The sender lives as long as the client, so an error cannot occur here
    let _ = shutdown.wait_for(|stop| *stop).await;
}
