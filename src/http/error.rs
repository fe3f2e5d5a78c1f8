//! Errors raised while reading and parsing an HTTP/1.1 message.

use std::fmt;
use std::io;

use thiserror::Error;

/// A request-target form the grammar recognises but does not serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetForm {
    /// `http://host/path` or `host:port`.
    AbsoluteOrAuthority,
    /// `*`
    Asterisk,
}

impl fmt::Display for TargetForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AbsoluteOrAuthority => f.write_str("absolute-form/authority-form"),
            Self::Asterisk => f.write_str("asterisk-form"),
        }
    }
}

/// Errors produced by the [`ByteCursor`](super::ByteCursor) and the grammar parser.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unexpected end of stream")]
    EndOfStream,

    #[error("unexpected byte '{}'; expected '{}'", .found.escape_ascii(), .expected.escape_ascii())]
    UnexpectedByte { found: u8, expected: u8 },

    #[error("unexpected byte '{}'; expected {expected}", .found.escape_ascii())]
    Unexpected { found: u8, expected: &'static str },

    #[error("{0} request targets are not supported")]
    UnsupportedTarget(TargetForm),

    #[error("header field count exceeds the limit of {limit}")]
    TooManyHeaders { limit: usize },

    #[error("{what} exceeds the limit of {limit} bytes")]
    TooLong { what: &'static str, limit: usize },

    #[error("path segment is not valid UTF-8")]
    InvalidUtf8,

    #[error("read deadline elapsed")]
    TimedOut,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ParseError {
    /// The input was well-formed but asks for a feature this server does not implement.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedTarget(_))
    }

    /// The peer went away, stalled past the deadline or the transport failed.
    ///
    /// Nobody is listening for an answer in these cases, so the connection is
    /// closed without a response.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::EndOfStream | Self::TimedOut | Self::Io(_))
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
