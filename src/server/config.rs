//! Server configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::server::error::Error;

/// Bytes requested from the socket per read.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1500;

/// Index file served for the `/` target.
pub const DEFAULT_INDEX_FILE: &str = "index.html";

/// HTTP server configuration.
///
/// Shared read-only by every connection worker once the server has started.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host name or IP literal to bind to.
    pub host: String,
    /// Port to bind to. `0` picks an ephemeral port.
    pub port: u16,
    /// Directory static assets are resolved under.
    pub document_root: PathBuf,
    /// File served for `/`, relative to the document root.
    pub index_file: String,
    /// The read buffer size.
    pub read_buffer_size: usize,
    /// Idle time after which a connection is closed, in milliseconds.
    pub read_timeout_ms: Option<u64>,
    /// The maximum number of concurrent connections, unbounded when unset.
    pub max_connections: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9000,
            document_root: PathBuf::from("."),
            index_file: DEFAULT_INDEX_FILE.to_string(),
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            read_timeout_ms: None,
            max_connections: None,
        }
    }
}

impl ServerConfig {
    /// Configuration for `host:port` serving files from `document_root`.
    pub fn new(host: impl Into<String>, port: u16, document_root: impl Into<PathBuf>) -> Self {
        Self {
            host: host.into(),
            port,
            document_root: document_root.into(),
            ..Self::default()
        }
    }

    /// Load a configuration from JSON. Missing fields take their defaults.
    ///
    /// ```
    /// use firefly_http::ServerConfig;
    ///
    /// let config = ServerConfig::from_json(r#"{"port": 8080, "document_root": "/srv/www"}"#).unwrap();
    /// assert_eq!(config.port, 8080);
    /// assert_eq!(config.index_file, "index.html");
    /// ```
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_index_file(mut self, index_file: impl Into<String>) -> Self {
        self.index_file = index_file.into();
        self
    }

    pub fn with_read_buffer_size(mut self, read_buffer_size: usize) -> Self {
        self.read_buffer_size = read_buffer_size;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = Some(max_connections);
        self
    }

    /// The per-connection read timeout, if any.
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }

    /// Reject settings the server cannot run with.
    pub fn validate(&self) -> Result<(), Error> {
        if self.read_buffer_size == 0 {
            return Err(Error::InvalidConfig("read_buffer_size must be greater than zero".to_string()));
        }
        if self.max_connections == Some(0) {
            return Err(Error::InvalidConfig("max_connections must be greater than zero".to_string()));
        }
        if self.index_file.is_empty() {
            return Err(Error::InvalidConfig("index_file must not be empty".to_string()));
        }
        Ok(())
    }
}
