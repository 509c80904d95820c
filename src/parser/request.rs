//! HTTP request parsing and representation.

use std::collections::HashMap;

use percent_encoding::percent_decode_str;

use crate::parser::error::Error;
use crate::parser::method::Method;
use crate::parser::version::HttpVersion;

/// String-keyed parameters handed to dynamic handlers.
///
/// A query entry written without `=` (`?flag`) maps to `None`.
pub type Params = HashMap<String, Option<String>>;

/// The subset of request headers the server acts on.
///
/// Any other header is read past and dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders {
    /// Declared body length, `0` when absent.
    pub content_length: usize,
    pub content_type: Option<String>,
    pub connection: Option<String>,
    pub host: Option<String>,
    pub user_agent: Option<String>,
    pub accept_encoding: Option<String>,
}

impl RequestHeaders {
    /// Extract the headers of interest from the lines following the request line.
    ///
    /// Names match case-insensitively. Each line is split at its first colon
    /// and both halves trimmed, so values containing colons survive intact.
    /// Lines without a colon are ignored.
    pub fn parse<'a>(lines: impl IntoIterator<Item = &'a str>) -> Result<Self, Error> {
        let mut headers = Self::default();

        for line in lines {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let name = name.trim();
            let value = value.trim();

            if name.eq_ignore_ascii_case("content-length") {
                headers.content_length = value
                    .parse()
                    .map_err(|_| Error::InvalidContentLength(value.to_string()))?;
            } else if name.eq_ignore_ascii_case("content-type") {
                headers.content_type = Some(value.to_string());
            } else if name.eq_ignore_ascii_case("connection") {
                headers.connection = Some(value.to_string());
            } else if name.eq_ignore_ascii_case("host") {
                headers.host = Some(value.to_string());
            } else if name.eq_ignore_ascii_case("user-agent") {
                headers.user_agent = Some(value.to_string());
            } else if name.eq_ignore_ascii_case("accept-encoding") {
                headers.accept_encoding = Some(value.to_string());
            }
        }

        Ok(headers)
    }
}

/// Represents an HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The request target exactly as sent
    pub target: String,
    /// The target without its query string
    pub path: String,
    /// The raw query string, if the target had one
    pub query: Option<String>,
    /// Query parameters, percent-decoded, last value wins
    pub query_params: Params,
    /// The HTTP version
    pub version: HttpVersion,
    /// The headers of interest
    pub headers: RequestHeaders,
    /// The request body, present when a non-zero Content-Length was declared
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Create a new HTTP request without a body.
    ///
    /// The path, raw query and query parameters are derived from `target`.
    pub fn new(method: Method, target: impl Into<String>, version: HttpVersion, headers: RequestHeaders) -> Self {
        let target = target.into();
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (target.clone(), None),
        };
        let query_params = query.as_deref().map(parse_query).unwrap_or_default();

        Self {
            method,
            target,
            path,
            query,
            query_params,
            version,
            headers,
            body: None,
        }
    }

    /// Create a new HTTP request with an optional body.
    pub fn with_body(
        method: Method,
        target: impl Into<String>,
        version: HttpVersion,
        headers: RequestHeaders,
        body: Option<Vec<u8>>,
    ) -> Self {
        let mut request = Self::new(method, target, version, headers);
        request.body = body;
        request
    }

    /// Get a query parameter value.
    ///
    /// Returns `None` both for a missing key and for a key sent without a value.
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).and_then(|value| value.as_deref())
    }

    /// Check if a query parameter exists, with or without a value.
    pub fn has_query_param(&self, name: &str) -> bool {
        self.query_params.contains_key(name)
    }

    /// The body decoded as UTF-8, replacing invalid sequences.
    pub fn body_text(&self) -> String {
        self.body
            .as_deref()
            .map(|body| String::from_utf8_lossy(body).into_owned())
            .unwrap_or_default()
    }

    /// Whether the client wants the connection kept open after the response.
    pub fn keep_alive(&self) -> bool {
        match self.headers.connection.as_deref() {
            Some(value) if value.eq_ignore_ascii_case("close") => false,
            Some(value) if value.eq_ignore_ascii_case("keep-alive") => true,
            _ => self.version.keep_alive_by_default(),
        }
    }
}

/// Split a request line into method, target and version.
///
/// The line must consist of exactly three non-empty tokens separated by
/// single spaces, and the method must be a valid token.
pub fn parse_request_line(line: &str) -> Result<(Method, String, HttpVersion), Error> {
    let malformed = || Error::MalformedRequestLine(line.to_string());

    let mut parts = line.split(' ');
    let (Some(method), Some(target), Some(version), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(malformed());
    };

    if method.is_empty() || target.is_empty() || version.is_empty() || !method.bytes().all(is_token_byte) {
        return Err(malformed());
    }

    Ok((Method::from(method), target.to_string(), HttpVersion::from(version)))
}

/// Parse a raw query string into parameters.
///
/// Entries split on `&`, then on the first `=`. Keys and values are
/// percent-decoded with `+` read as a space.
pub fn parse_query(query: &str) -> Params {
    query
        .split('&')
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((key, value)) => (decode_component(key), Some(decode_component(value))),
            None => (decode_component(entry), None),
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

// RFC 9110 tchar
fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}
