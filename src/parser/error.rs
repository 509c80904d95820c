//! Error types for the HTTP parser.

use thiserror::Error;

/// Errors that can occur while decoding an HTTP request.
///
/// Every variant describes a single dropped exchange. None of them is fatal
/// for the connection the bytes arrived on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The request is empty.
    #[error("Empty request")]
    EmptyRequest,

    /// The request line did not split into method, target and version.
    #[error("Malformed request line: {0}")]
    MalformedRequestLine(String),

    /// The Content-Length header is not a decimal byte count.
    #[error("Invalid Content-Length: {0}")]
    InvalidContentLength(String),

    /// The input ended before a full request was available.
    #[error("Incomplete request")]
    Incomplete,

    /// The request head is not valid UTF-8.
    #[error("Request head is not valid UTF-8")]
    InvalidUtf8,
}
