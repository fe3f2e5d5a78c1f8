//! HTTP/1.1 response builder and serializer.
//!
//! Serialization is deterministic and adds nothing of its own: the status
//! line, every header value, a blank line, then the body bytes verbatim.

use bytes::{BufMut, Bytes, BytesMut};

use super::{Headers, StatusCode};

/// An HTTP/1.1 response, ready to be serialized and sent.
///
/// # Examples
///
/// ```
/// use h1serve::http::{Response, StatusCode};
///
/// let response = Response::new(StatusCode::OK)
///     .header("Content-Type", "application/json")
///     .body(r#"{"status":"ok"}"#);
///
/// let bytes = response.to_bytes();
/// assert_eq!(
///     &bytes[..],
///     b"HTTP/1.1 200 OK\r\nContent-Type:application/json\r\n\r\n{\"status\":\"ok\"}"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    headers: Headers,
    body: Bytes,
}

impl Response {
    /// Creates a new response with the given status and an empty body.
    pub fn new(status: impl Into<StatusCode>) -> Self {
        Self {
            status: status.into(),
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    /// `200 OK` with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK).body(body)
    }

    /// Appends a response header. Multiple calls with the same name are additive.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Appends a header in-place.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name, value);
    }

    /// Sets the response body from a string.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Bytes::from(body.into());
        self
    }

    /// Sets the response body from raw bytes.
    #[must_use]
    pub fn body_bytes(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body_ref(&self) -> &Bytes {
        &self.body
    }

    /// Drops the body, leaving status and headers untouched.
    pub fn clear_body(&mut self) {
        self.body = Bytes::new();
    }

    /// Serializes the response using HTTP/1.1 wire format.
    ///
    /// Codes without a known reason phrase render with an empty one.
    pub fn to_bytes(&self) -> BytesMut {
        let reason = self.status.canonical_reason().unwrap_or("");
        let mut buf = BytesMut::with_capacity(64 + self.headers.len() * 32 + self.body.len());

        buf.put(format!("HTTP/1.1 {} {reason}\r\n", self.status.as_u16()).as_bytes());
        buf.put(self.headers.to_string().as_bytes());
        buf.put(&b"\r\n"[..]);
        buf.put(self.body.as_ref());

        buf
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new(StatusCode::OK)
    }
}
