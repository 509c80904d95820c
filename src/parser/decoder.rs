//! Incremental request decoding over a connection's byte stream.

use crate::parser::error::Error;
use crate::parser::request::{parse_request_line, HttpRequest, RequestHeaders};

/// Accumulates bytes read from one connection and yields complete requests.
///
/// A request is complete once its header block (terminated by an empty line)
/// and exactly `Content-Length` body bytes are buffered. A rejected request
/// line is reported as soon as it is complete; the rest of its exchange, up to
/// the end of its header block plus any declared body, is then dropped as it
/// arrives, so a well-formed request that follows is still decoded.
#[derive(Debug, Default)]
pub struct RequestDecoder {
    buffer: Vec<u8>,
    discard: Option<Discard>,
}

/// What is left of a rejected exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Discard {
    Head,
    Body(usize),
}

impl RequestDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append freshly read bytes.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Number of bytes buffered but not yet consumed.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Take the next request out of the buffer.
    ///
    /// Returns `None` when more bytes are needed, `Some(Err(_))` when an
    /// exchange was rejected and dropped, and `Some(Ok(_))` for a complete
    /// request.
    pub fn next_request(&mut self) -> Option<Result<HttpRequest, Error>> {
        if !self.discard_rejected() {
            return None;
        }
        self.skip_blank_lines();

        let line_end = self.buffer.iter().position(|&b| b == b'\n')?;

        let request_line = std::str::from_utf8(&self.buffer[..line_end])
            .map_err(|_| Error::InvalidUtf8)
            .and_then(|line| parse_request_line(line.trim_end_matches('\r')));

        let (method, target, version) = match request_line {
            Ok(parts) => parts,
            Err(err) => {
                self.buffer.drain(..=line_end);
                self.discard = Some(Discard::Head);
                return Some(Err(err));
            }
        };

        let (header_end, body_start) = find_head_end(&self.buffer)?;

        let headers = std::str::from_utf8(&self.buffer[line_end + 1..header_end])
            .map_err(|_| Error::InvalidUtf8)
            .and_then(|head| RequestHeaders::parse(head.lines()));
        let headers = match headers {
            Ok(headers) => headers,
            Err(err) => {
                self.buffer.drain(..body_start);
                return Some(Err(err));
            }
        };

        let Some(total) = body_start.checked_add(headers.content_length) else {
            self.buffer.drain(..body_start);
            return Some(Err(Error::InvalidContentLength(headers.content_length.to_string())));
        };
        if self.buffer.len() < total {
            return None;
        }

        let body = (headers.content_length > 0).then(|| self.buffer[body_start..total].to_vec());
        self.buffer.drain(..total);

        Some(Ok(HttpRequest::with_body(method, target, version, headers, body)))
    }

    /// Drop what has arrived of a rejected exchange. Returns `false` while
    /// part of it is still outstanding.
    fn discard_rejected(&mut self) -> bool {
        loop {
            match self.discard {
                None => return true,
                Some(Discard::Head) => {
                    // The request line is already gone, so the block may be empty.
                    let body_start = match self.buffer.as_slice() {
                        [b'\n', ..] => 1,
                        [b'\r', b'\n', ..] => 2,
                        _ => match find_head_end(&self.buffer) {
                            Some((_, body_start)) => body_start,
                            None => return false,
                        },
                    };
                    let content_length = std::str::from_utf8(&self.buffer[..body_start])
                        .ok()
                        .and_then(|head| RequestHeaders::parse(head.lines()).ok())
                        .map_or(0, |headers| headers.content_length);
                    self.buffer.drain(..body_start);
                    self.discard = (content_length > 0).then_some(Discard::Body(content_length));
                }
                Some(Discard::Body(remaining)) => {
                    let dropped = remaining.min(self.buffer.len());
                    self.buffer.drain(..dropped);
                    if dropped < remaining {
                        self.discard = Some(Discard::Body(remaining - dropped));
                        return false;
                    }
                    self.discard = None;
                }
            }
        }
    }

    fn skip_blank_lines(&mut self) {
        let skip = self
            .buffer
            .iter()
            .position(|&b| b != b'\r' && b != b'\n')
            .unwrap_or(self.buffer.len());
        // Keep a trailing lone '\r' in case its '\n' is still in flight.
        let skip = if skip == self.buffer.len() && self.buffer.last() == Some(&b'\r') {
            skip - 1
        } else {
            skip
        };
        self.buffer.drain(..skip);
    }
}

/// Locate the empty line that ends the header block.
///
/// Returns the index just past the last header line's `\n` and the index
/// where the body starts.
fn find_head_end(buffer: &[u8]) -> Option<(usize, usize)> {
    buffer.iter().enumerate().find_map(|(i, &b)| {
        if b != b'\n' {
            return None;
        }
        match &buffer[i + 1..] {
            [b'\n', ..] => Some((i + 1, i + 2)),
            [b'\r', b'\n', ..] => Some((i + 1, i + 3)),
            _ => None,
        }
    })
}
