//! One-byte-lookahead buffered reader over an async byte stream.
//!
//! Every parsing primitive in this crate is built on [`ByteCursor`]. Bytes are
//! pulled from the underlying reader in chunks into a [`BytesMut`]; `peek`
//! inspects the front of that buffer and all consuming reads take from the
//! same front, so a peeked byte is always the next byte any read returns.

use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::{Instant, timeout_at};

use super::error::{ParseError, ParseResult};

/// Read granularity, also the growth step of [`ByteCursor::read_remaining`].
const CHUNK_SIZE: usize = 1024;

/// A buffered cursor with single-byte lookahead.
///
/// # Examples
///
/// ```
/// use h1serve::http::ByteCursor;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), h1serve::http::ParseError> {
/// let mut cursor = ByteCursor::new(&b"GET /"[..]);
/// assert_eq!(cursor.peek().await?, b'G');
/// cursor.expect(b"GET ").await?;
/// assert_eq!(cursor.next().await?, b'/');
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ByteCursor<R> {
    reader: R,
    buf: BytesMut,
    consumed: usize,
    deadline: Option<Instant>,
}

impl<R> ByteCursor<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: BytesMut::with_capacity(CHUNK_SIZE),
            consumed: 0,
            deadline: None,
        }
    }

    /// Fails every read that has to wait on the reader past `deadline`
    /// with [`ParseError::TimedOut`]. Already buffered bytes are still served.
    pub fn set_deadline(&mut self, deadline: Option<Instant>) {
        self.deadline = deadline;
    }

    /// Total number of bytes handed out by consuming reads so far.
    pub fn position(&self) -> usize {
        self.consumed
    }

    /// Consumes and returns the next byte.
    ///
    /// # Errors
    ///
    /// [`ParseError::EndOfStream`] if the reader is exhausted.
    pub async fn next(&mut self) -> ParseResult<u8> {
        self.fill().await?;
        self.consumed += 1;
        Ok(self.buf.get_u8())
    }

    /// Returns the next byte without consuming it. Repeated peeks return the same byte.
    pub async fn peek(&mut self) -> ParseResult<u8> {
        self.fill().await?;
        Ok(self.buf[0])
    }

    /// Consumes exactly `literal.len()` bytes, failing on the first mismatch.
    ///
    /// # Errors
    ///
    /// [`ParseError::UnexpectedByte`] naming the offending and the expected byte,
    /// or [`ParseError::EndOfStream`] if the stream ends early.
    pub async fn expect(&mut self, literal: &[u8]) -> ParseResult<()> {
        for &expected in literal {
            let found = self.next().await?;
            if found != expected {
                return Err(ParseError::UnexpectedByte { found, expected });
            }
        }
        Ok(())
    }

    /// Reads exactly `n` bytes, waiting for the reader as long as needed.
    ///
    /// The buffer grows at most one chunk per read, so memory follows the
    /// bytes actually received rather than `n`.
    ///
    /// # Errors
    ///
    /// [`ParseError::EndOfStream`] if the stream ends before `n` bytes arrive.
    pub async fn read_exact(&mut self, n: usize) -> ParseResult<Bytes> {
        while self.buf.len() < n {
            self.buf.reserve((n - self.buf.len()).min(CHUNK_SIZE));
            if self.read_more().await? == 0 {
                return Err(ParseError::EndOfStream);
            }
        }
        self.consumed += n;
        Ok(self.buf.split_to(n).freeze())
    }

    /// Drains the stream until end-of-stream and returns everything not yet consumed.
    pub async fn read_remaining(&mut self) -> ParseResult<Bytes> {
        loop {
            self.buf.reserve(CHUNK_SIZE);
            if self.read_more().await? == 0 {
                break;
            }
        }
        self.consumed += self.buf.len();
        Ok(self.buf.split().freeze())
    }

    /// Releases the underlying reader. Buffered, unconsumed bytes are dropped.
    pub fn into_inner(self) -> R {
        self.reader
    }

    async fn fill(&mut self) -> ParseResult<()> {
        if self.buf.is_empty() {
            self.buf.reserve(CHUNK_SIZE);
            if self.read_more().await? == 0 {
                return Err(ParseError::EndOfStream);
            }
        }
        Ok(())
    }

    async fn read_more(&mut self) -> ParseResult<usize> {
        let deadline = self.deadline;
        let read = self.reader.read_buf(&mut self.buf);
        match deadline {
            Some(deadline) => timeout_at(deadline, read)
                .await
                .map_err(|_| ParseError::TimedOut)?
                .map_err(ParseError::from),
            None => Ok(read.await?),
        }
    }
}
