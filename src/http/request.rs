//! Parsed request and status-line models.

use bytes::Bytes;

use super::{Headers, Method, StatusCode, Version};

/// `method SP request-target SP HTTP-version CRLF`, with the target split into
/// percent-decoded path segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    /// The method token exactly as received.
    pub method: String,
    /// Path segments without their leading `/`. `/` alone yields one empty segment.
    pub target: Vec<String>,
    /// Raw query component (without the `?`), if the target carried one.
    pub query: Option<String>,
    pub version: Version,
}

impl RequestLine {
    /// Rebuilds the path from its segments. Decoded `/` bytes inside a segment
    /// are emitted as-is, so this is for display only.
    pub fn path(&self) -> String {
        self.target.iter().fold(String::new(), |mut path, segment| {
            path.push('/');
            path.push_str(segment);
            path
        })
    }
}

/// `HTTP-version SP status-code SP reason-phrase CRLF`; the reason phrase is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusLine {
    pub version: Version,
    pub status: StatusCode,
}

/// A parsed HTTP/1.1 request.
///
/// Built once per connection by [`parse_message`](super::parser::parse_message).
/// The body stays empty until the dispatcher reads the declared
/// `Content-Length` bytes; after that the request is immutable.
///
/// # Examples
///
/// ```
/// use h1serve::http::{parser, ByteCursor, Method};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), h1serve::http::ParseError> {
/// let raw = b"GET /hello/world?x=1 HTTP/1.1\r\nHost: localhost\r\n\r\n";
/// let mut cursor = ByteCursor::new(&raw[..]);
/// let request = parser::parse_message(&mut cursor).await?;
///
/// assert_eq!(request.method(), Method::Get);
/// assert_eq!(request.segments(), ["hello", "world"]);
/// assert_eq!(request.query_string(), Some("x=1"));
/// assert_eq!(request.headers().get("host"), Some("localhost"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    line: RequestLine,
    headers: Headers,
    body: Bytes,
}

impl Request {
    pub fn new(line: RequestLine, headers: Headers) -> Self {
        Self {
            line,
            headers,
            body: Bytes::new(),
        }
    }

    pub fn request_line(&self) -> &RequestLine {
        &self.line
    }

    /// Returns the method, standard names folded case-insensitively.
    pub fn method(&self) -> Method {
        match self.line.method.parse() {
            Ok(method) => method,
            Err(never) => match never {},
        }
    }

    /// The method token exactly as it appeared on the wire.
    pub fn method_str(&self) -> &str {
        &self.line.method
    }

    /// Decoded path segments.
    pub fn segments(&self) -> &[String] {
        &self.line.target
    }

    pub fn path(&self) -> String {
        self.line.path()
    }

    /// Returns the raw query string (without the leading `?`), if any.
    pub fn query_string(&self) -> Option<&str> {
        self.line.query.as_deref()
    }

    pub fn version(&self) -> Version {
        self.line.version
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the request body bytes; empty unless `Content-Length` declared one.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub(crate) fn set_body(&mut self, body: Bytes) {
        self.body = body;
    }
}
