//! Client configuration.
//!
//! Every field has a default, so a configuration file only needs to name
//! the server:
//!
//! ```
//! use notifywire_client::ClientConfig;
//!
//! let config = ClientConfig::from_json(br#"{"address": "notify.example.com", "port": 4443}"#).unwrap();
//! assert_eq!(config.port, 4443);
//! assert_eq!(config.reconnect_delay_secs, 10);
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{NotifyError, Result};
use crate::protocol::{DEFAULT_BUFFER_LIMIT, DEFAULT_READ_CHUNK_SIZE};
use crate::writer::WriterConfig;

/// Default delay between failed connection attempts.
pub const DEFAULT_RECONNECT_DELAY_SECS: u64 = 10;

/// Configuration for a [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server host name or IP address.
    #[serde(default)]
    pub address: String,

    /// Server port.
    #[serde(default)]
    pub port: u16,

    /// Name used for TLS verification (defaults to `address`).
    #[serde(default)]
    pub server_name: Option<String>,

    /// PEM bundle replacing the built-in trust roots.
    #[serde(default)]
    pub ca_file: Option<PathBuf>,

    /// Receive buffer capacity in bytes; reaching it is fatal.
    #[serde(default = "default_buffer_limit")]
    pub buffer_limit: usize,

    /// Size of a single socket read.
    #[serde(default = "default_read_chunk_size")]
    pub read_chunk_size: usize,

    /// Delay after a failed connection attempt.
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,

    /// Outbound writer settings.
    #[serde(default)]
    pub writer: WriterConfig,
}

fn default_buffer_limit() -> usize {
    DEFAULT_BUFFER_LIMIT
}

fn default_read_chunk_size() -> usize {
    DEFAULT_READ_CHUNK_SIZE
}

fn default_reconnect_delay_secs() -> u64 {
    DEFAULT_RECONNECT_DELAY_SECS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            port: 0,
            server_name: None,
            ca_file: None,
            buffer_limit: default_buffer_limit(),
            read_chunk_size: default_read_chunk_size(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
            writer: WriterConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Configuration for `address:port` with all other settings defaulted.
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
            ..Self::default()
        }
    }

    /// Create configuration from JSON bytes.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| NotifyError::Config(format!("failed to parse configuration: {e}")))
    }

    /// Delay after a failed connection attempt.
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    /// Check the configuration for values the client cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(NotifyError::Config("server address is empty".into()));
        }
        if self.buffer_limit == 0 {
            return Err(NotifyError::Config("buffer_limit must be positive".into()));
        }
        if self.read_chunk_size == 0 {
            return Err(NotifyError::Config("read_chunk_size must be positive".into()));
        }
        Ok(())
    }
}
