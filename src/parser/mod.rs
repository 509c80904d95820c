//! HTTP request parsing.
//!
//! Requests are decoded incrementally from a connection's byte stream by
//! [`RequestDecoder`]. [`parse_request`] is a one-shot wrapper for input that
//! is already complete.

mod decoder;
mod request;
mod method;
mod version;
mod error;

// Re-export public items
pub use decoder::RequestDecoder;
pub use request::{HttpRequest, Params, RequestHeaders, parse_query, parse_request_line};
pub use method::Method;
pub use version::HttpVersion;
pub use error::Error;

/// Parse a single complete HTTP request from a byte slice.
///
/// # Examples
///
/// ```
/// use firefly_http::parse_request;
///
/// let request = parse_request(b"GET /greet?name=Ada HTTP/1.1\r\nHost: example.com\r\n\r\n").unwrap();
///
/// assert_eq!(request.method.to_string(), "GET");
/// assert_eq!(request.path, "/greet");
/// assert_eq!(request.get_query_param("name"), Some("Ada"));
/// assert_eq!(request.headers.host.as_deref(), Some("example.com"));
/// ```
pub fn parse_request(input: &[u8]) -> Result<HttpRequest, Error> {
    if input.is_empty() {
        return Err(Error::EmptyRequest);
    }

    let mut decoder = RequestDecoder::new();
    decoder.extend(input);
    decoder.next_request().unwrap_or(Err(Error::Incomplete))
}
