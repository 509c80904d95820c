//! HTTP response types and serialization.

use std::time::SystemTime;

use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Value of the `Server` header.
pub const SERVER_NAME: &str = concat!("firefly-http/", env!("CARGO_PKG_VERSION"));

/// Body sent for every unresolvable route.
pub const NOT_FOUND_PAGE: &str = "<!DOCTYPE html>\
<html><head><title>Page not found | Firefly web server</title></head>\
<body><h3>Requested page not found</h3></body></html>";

/// HTTP status codes with their standard reason phrases.
///
/// The server itself only produces `Ok`, `NotFound` and, when a connection
/// limit is configured, `ServiceUnavailable`. The rest are vocabulary for
/// host applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Ok = 200,
    Created = 201,
    Accepted = 202,
    NoContent = 204,
    PartialContent = 206,
    MultiStatus = 207,
    MovedPermanently = 301,
    SeeOther = 303,
    NotModified = 304,
    TemporaryRedirect = 307,
    BadRequest = 400,
    Unauthorized = 401,
    Forbidden = 403,
    NotFound = 404,
    MethodNotAllowed = 405,
    NotAcceptable = 406,
    RequestTimeout = 408,
    Conflict = 409,
    Gone = 410,
    LengthRequired = 411,
    PreconditionFailed = 412,
    PayloadTooLarge = 413,
    UnsupportedMediaType = 415,
    RangeNotSatisfiable = 416,
    ExpectationFailed = 417,
    TooManyRequests = 429,
    InternalServerError = 500,
    NotImplemented = 501,
    ServiceUnavailable = 503,
    HttpVersionNotSupported = 505,
}

impl StatusCode {
    /// The numeric status code.
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::Accepted => "Accepted",
            StatusCode::NoContent => "No Content",
            StatusCode::PartialContent => "Partial Content",
            StatusCode::MultiStatus => "Multi-Status",
            StatusCode::MovedPermanently => "Moved Permanently",
            StatusCode::SeeOther => "See Other",
            StatusCode::NotModified => "Not Modified",
            StatusCode::TemporaryRedirect => "Temporary Redirect",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Unauthorized => "Unauthorized",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::NotAcceptable => "Not Acceptable",
            StatusCode::RequestTimeout => "Request Timeout",
            StatusCode::Conflict => "Conflict",
            StatusCode::Gone => "Gone",
            StatusCode::LengthRequired => "Length Required",
            StatusCode::PreconditionFailed => "Precondition Failed",
            StatusCode::PayloadTooLarge => "Payload Too Large",
            StatusCode::UnsupportedMediaType => "Unsupported Media Type",
            StatusCode::RangeNotSatisfiable => "Range Not Satisfiable",
            StatusCode::ExpectationFailed => "Expectation Failed",
            StatusCode::TooManyRequests => "Too Many Requests",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
            StatusCode::ServiceUnavailable => "Service Unavailable",
            StatusCode::HttpVersionNotSupported => "HTTP Version Not Supported",
        }
    }
}

/// A response payload: text or opaque bytes, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Text(String),
    Binary(Vec<u8>),
}

impl Body {
    /// The bytes that go on the wire.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Body::Text(text) => text.as_bytes(),
            Body::Binary(bytes) => bytes,
        }
    }

    /// Length in bytes, which is what Content-Length reports.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Represents an HTTP response.
///
/// Built per request and written once; nothing here outlives the exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// The HTTP status code
    pub status: StatusCode,
    /// Value of the Content-Type header
    pub content_type: String,
    /// Whether the connection stays open after this response
    pub keep_alive: bool,
    /// The response body
    pub body: Body,
}

impl HttpResponse {
    /// Create a new HTTP response with the given status code, an empty text
    /// body, `text/html` content type and keep-alive on.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            content_type: "text/html".to_string(),
            keep_alive: true,
            body: Body::Text(String::new()),
        }
    }

    /// The fixed 404 page.
    pub fn not_found() -> Self {
        Self::new(StatusCode::NotFound).with_text(NOT_FOUND_PAGE)
    }

    /// Set the response body with a string.
    pub fn with_text(mut self, body: impl Into<String>) -> Self {
        self.body = Body::Text(body.into());
        self
    }

    /// Set the response body with bytes.
    pub fn with_bytes(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Body::Binary(body.into());
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Serialize the status line and headers, stamped with `date`.
    ///
    /// Header order is fixed: Content-Type, Date, Connection, Content-Length,
    /// Server.
    pub fn head_bytes(&self, date: SystemTime) -> Vec<u8> {
        let connection = if self.keep_alive { "keep-alive" } else { "close" };
        format!(
            "HTTP/1.1 {code} {reason}\r\n\
             Content-Type: {content_type}\r\n\
             Date: {date}\r\n\
             Connection: {connection}\r\n\
             Content-Length: {length}\r\n\
             Server: {SERVER_NAME}\r\n\
             \r\n",
            code = self.status.code(),
            reason = self.status.reason_phrase(),
            content_type = self.content_type,
            date = httpdate::fmt_http_date(date),
            length = self.body.len(),
        )
        .into_bytes()
    }

    /// Convert the response to bytes, dated now.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.head_bytes(SystemTime::now());
        bytes.extend_from_slice(self.body.as_bytes());
        bytes
    }
}

/// Write `response` to `writer`: the head first, then the body unchanged.
pub async fn write_response<W>(writer: &mut W, response: &HttpResponse) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    writer.write_all(&response.head_bytes(SystemTime::now())).await?;
    match &response.body {
        Body::Text(text) => writer.write_all(text.as_bytes()).await?,
        Body::Binary(bytes) => writer.write_all(bytes).await?,
    }
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use super::*;

    fn epoch_plus(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn test_head_layout() {
        let response = HttpResponse::new(StatusCode::Ok)
            .with_content_type("image/png")
            .with_bytes(vec![0x89, b'P', b'N', b'G']);

        let head = String::from_utf8(response.head_bytes(epoch_plus(784_111_777))).unwrap();
        assert_eq!(
            head,
            format!(
                "HTTP/1.1 200 OK\r\n\
                 Content-Type: image/png\r\n\
                 Date: Sun, 06 Nov 1994 08:49:37 GMT\r\n\
                 Connection: keep-alive\r\n\
                 Content-Length: 4\r\n\
                 Server: {SERVER_NAME}\r\n\
                 \r\n"
            )
        );
    }

    #[test]
    fn test_content_length_counts_bytes_not_chars() {
        let response = HttpResponse::new(StatusCode::Ok).with_text("héllo wörld");
        let head = String::from_utf8(response.head_bytes(SystemTime::now())).unwrap();
        assert!(head.contains("Content-Length: 13\r\n"));
    }

    #[test]
    fn test_connection_close() {
        let response = HttpResponse::new(StatusCode::Ok).with_keep_alive(false);
        let head = String::from_utf8(response.head_bytes(SystemTime::now())).unwrap();
        assert!(head.contains("Connection: close\r\n"));
    }

    #[test]
    fn test_not_found_page() {
        let response = HttpResponse::not_found();
        assert_eq!(response.status, StatusCode::NotFound);
        assert_eq!(response.content_type, "text/html");
        assert_eq!(response.body, Body::Text(NOT_FOUND_PAGE.to_string()));

        let bytes = response.to_bytes();
        assert!(bytes.starts_with(b"HTTP/1.1 404 Not Found\r\n"));
        assert!(bytes.ends_with(NOT_FOUND_PAGE.as_bytes()));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(StatusCode::Ok.code(), 200);
        assert_eq!(StatusCode::MultiStatus.code(), 207);
        assert_eq!(StatusCode::TooManyRequests.code(), 429);
        assert_eq!(StatusCode::HttpVersionNotSupported.code(), 505);
        assert_eq!(StatusCode::RangeNotSatisfiable.reason_phrase(), "Range Not Satisfiable");
    }

    #[tokio::test]
    async fn test_write_binary_body_untouched() {
        let payload: Vec<u8> = (0..=255).collect();
        let response = HttpResponse::new(StatusCode::Ok)
            .with_content_type("image/png")
            .with_bytes(payload.clone());

        let mut out = Vec::new();
        write_response(&mut out, &response).await.unwrap();

        let split = out.windows(4).position(|w| w == b"\r\n\r\n").unwrap() + 4;
        assert_eq!(&out[split..], &payload[..]);
    }
}
