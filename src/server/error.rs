//! Error types for the HTTP server.

use thiserror::Error;

/// Errors that can occur during HTTP server operation.
///
/// Per-request failures never surface here; they are answered on the wire
/// or dropped inside the connection worker.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The configured host did not resolve to any socket address.
    #[error("Could not resolve bind address: {0}")]
    AddrResolve(String),

    /// `start` was called on a server that is already accepting.
    #[error("Server is already running")]
    AlreadyRunning,

    /// The configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
