//! HTTP protocol versions.

use std::fmt;

/// HTTP protocol version named on the request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpVersion {
    Http10,
    Http11,
    Http20,
    /// Unrecognized version token, kept as sent.
    Other(String),
}

impl From<&str> for HttpVersion {
    fn from(s: &str) -> Self {
        match s {
            "HTTP/1.0" => HttpVersion::Http10,
            "HTTP/1.1" => HttpVersion::Http11,
            "HTTP/2" | "HTTP/2.0" => HttpVersion::Http20,
            other => HttpVersion::Other(other.to_string()),
        }
    }
}

impl HttpVersion {
    /// Whether connections stay open by default under this version.
    pub fn keep_alive_by_default(&self) -> bool {
        !matches!(self, HttpVersion::Http10)
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpVersion::Http10 => write!(f, "HTTP/1.0"),
            HttpVersion::Http11 => write!(f, "HTTP/1.1"),
            HttpVersion::Http20 => write!(f, "HTTP/2"),
            HttpVersion::Other(token) => write!(f, "{token}"),
        }
    }
}
