//! HTTP/1.1 protocol types, grammar and wire serialization.
//!
//! This module provides the core primitives: [`ByteCursor`] for lookahead
//! reads, the recursive-descent [`parser`], [`Request`] / [`Response`] models
//! and the status-code table used by [`Response::to_bytes`].

use std::fmt;

pub mod cursor;
pub mod error;
pub mod headers;
pub mod parser;
pub mod request;
pub mod response;

pub use cursor::ByteCursor;
pub use error::{ParseError, ParseResult, TargetForm};
pub use headers::{HeaderField, Headers};
pub use request::{Request, RequestLine, StatusLine};
pub use response::Response;

/// An HTTP response status code.
///
/// Any three-digit code can be represented; [`canonical_reason`](Self::canonical_reason)
/// knows the phrase for a fixed subset.
///
/// # Examples
///
/// ```
/// use h1serve::http::StatusCode;
///
/// let status = StatusCode::NOT_FOUND;
/// assert_eq!(status.as_u16(), 404);
/// assert_eq!(status.canonical_reason(), Some("Not Found"));
/// assert_eq!(StatusCode::from_u16(299).canonical_reason(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatusCode(u16);

impl StatusCode {
    // 1xx Informational
    pub const CONTINUE: Self = Self(100);
    pub const SWITCHING_PROTOCOLS: Self = Self(101);

    // 2xx Success
    pub const OK: Self = Self(200);
    pub const CREATED: Self = Self(201);
    pub const ACCEPTED: Self = Self(202);
    pub const NO_CONTENT: Self = Self(204);

    // 3xx Redirection
    pub const MOVED_PERMANENTLY: Self = Self(301);
    pub const FOUND: Self = Self(302);
    pub const SEE_OTHER: Self = Self(303);
    pub const TEMPORARY_REDIRECT: Self = Self(307);

    // 4xx Client Error
    pub const BAD_REQUEST: Self = Self(400);
    pub const FORBIDDEN: Self = Self(403);
    pub const NOT_FOUND: Self = Self(404);
    pub const METHOD_NOT_ALLOWED: Self = Self(405);
    pub const PAYLOAD_TOO_LARGE: Self = Self(413);
    pub const EXPECTATION_FAILED: Self = Self(417);

    // 5xx Server Error
    pub const INTERNAL_SERVER_ERROR: Self = Self(500);
    pub const NOT_IMPLEMENTED: Self = Self(501);
    pub const HTTP_VERSION_NOT_SUPPORTED: Self = Self(505);

    pub const fn from_u16(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric status code as a `u16`.
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns the reason phrase for this status code, if it is in the table.
    pub fn canonical_reason(self) -> Option<&'static str> {
        let reason = match self.0 {
            100 => "Continue",
            101 => "Switching Protocols",
            200 => "OK",
            201 => "Created",
            202 => "Accepted",
            203 => "Non-Authoritative Information",
            204 => "No Content",
            205 => "Reset Content",
            300 => "Multiple Choices",
            301 => "Moved Permanently",
            302 => "Found",
            303 => "See Other",
            305 => "Use Proxy",
            307 => "Temporary Redirect",
            400 => "Bad Request",
            402 => "Payment Required",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            406 => "Not Acceptable",
            408 => "Request Timeout",
            409 => "Conflict",
            410 => "Gone",
            411 => "Length Required",
            413 => "Payload Too Large",
            414 => "URI Too Long",
            415 => "Unsupported Media Type",
            417 => "Expectation Failed",
            426 => "Upgrade Required",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            505 => "HTTP Version Not Supported",
            _ => return None,
        };
        Some(reason)
    }

    /// Returns `true` for 2xx codes.
    pub fn is_success(self) -> bool {
        (200..300).contains(&self.0)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, self.canonical_reason().unwrap_or(""))
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl From<StatusCode> for u16 {
    fn from(code: StatusCode) -> u16 {
        code.as_u16()
    }
}

/// An HTTP request method.
///
/// Standard methods are matched case-insensitively when parsed; anything else
/// is captured verbatim in the `Custom` variant.
///
/// # Examples
///
/// ```
/// use h1serve::http::Method;
///
/// let method: Method = "get".parse().unwrap();
/// assert_eq!(method, Method::Get);
/// assert_eq!(method.as_str(), "GET");
/// assert_eq!("BREW".parse::<Method>().unwrap(), Method::Custom("BREW".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
    Connect,
    Trace,
    /// A non-standard extension method.
    Custom(String),
}

impl Method {
    /// Returns the method as a string slice.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch => "PATCH",
            Self::Connect => "CONNECT",
            Self::Trace => "TRACE",
            Self::Custom(s) => s.as_str(),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const STANDARD: [Method; 9] = [
            Method::Get,
            Method::Post,
            Method::Put,
            Method::Delete,
            Method::Head,
            Method::Options,
            Method::Patch,
            Method::Connect,
            Method::Trace,
        ];
        Ok(STANDARD
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .unwrap_or_else(|| Self::Custom(s.to_owned())))
    }
}

impl AsRef<str> for Method {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// An HTTP version packed into one byte: major in the high nibble, minor in the low.
///
/// # Examples
///
/// ```
/// use h1serve::http::Version;
///
/// let v = Version::new(1, 1);
/// assert_eq!(v.as_u8(), 0x11);
/// assert_eq!(v.major(), 1);
/// assert_eq!(v.to_string(), "HTTP/1.1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version(u8);

impl Version {
    pub const HTTP_10: Self = Self(0x10);
    pub const HTTP_11: Self = Self(0x11);

    /// Packs `major` and `minor`; each must be a single decimal digit.
    pub const fn new(major: u8, minor: u8) -> Self {
        Self((major << 4) | (minor & 0x0F))
    }

    pub const fn from_packed(packed: u8) -> Self {
        Self(packed)
    }

    pub const fn as_u8(self) -> u8 {
        self.0
    }

    pub const fn major(self) -> u8 {
        self.0 >> 4
    }

    pub const fn minor(self) -> u8 {
        self.0 & 0x0F
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP/{}.{}", self.major(), self.minor())
    }
}
