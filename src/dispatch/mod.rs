//! Request dispatch — the per-request validation state machine.
//!
//! [`Dispatcher::dispatch`] runs once per parsed request, with the cursor
//! positioned right after the header section. Checks run in a fixed order and
//! the first failing check produces the response:
//!
//! 1. version major must be 1, else `505`
//! 2. exactly one `Host` value, else `400`
//! 3. at most one `Content-Length`, a non-negative integer, else `400`;
//!    above the configured limit `413`; otherwise the body is read
//! 4. every `Expect` value is refused with `417` (`100-continue` included)
//! 5. `GET`/`HEAD` go to the router (`404` if unclaimed), anything else `501`
//!
//! Header names are compared case-insensitively.

use tokio::io::AsyncRead;
use tracing::debug;

use crate::http::{ByteCursor, Method, ParseResult, Request, Response, StatusCode};
use crate::router::Router;

const HOST: &str = "Host";
const CONTENT_LENGTH: &str = "Content-Length";
const EXPECT: &str = "Expect";

/// Body of the `505` response.
pub const VERSION_NOT_SUPPORTED_BODY: &str = "This server only supports HTTP/1.x.";

/// Validates a request against protocol invariants and routes it.
#[derive(Clone, Copy)]
pub struct Dispatcher<'a> {
    router: &'a Router,
    max_body_size: usize,
}

impl<'a> Dispatcher<'a> {
    pub fn new(router: &'a Router, max_body_size: usize) -> Self {
        Self {
            router,
            max_body_size,
        }
    }

    /// Produces the response for `request`, reading its body from `cursor` if one is declared.
    ///
    /// Validation failures are answered with fixed responses; only a failed
    /// body read is returned as an error.
    ///
    /// # Errors
    ///
    /// [`ParseError::EndOfStream`](crate::http::ParseError::EndOfStream) or an
    /// I/O error if fewer than `Content-Length` bytes can be read.
    pub async fn dispatch<R>(
        &self,
        mut request: Request,
        cursor: &mut ByteCursor<R>,
    ) -> ParseResult<Response>
    where
        R: AsyncRead + Unpin,
    {
        if request.version().major() != 1 {
            return Ok(Response::new(StatusCode::HTTP_VERSION_NOT_SUPPORTED)
                .body(VERSION_NOT_SUPPORTED_BODY));
        }

        if request.headers().count(HOST) != 1 {
            debug!(count = request.headers().count(HOST), "rejecting request: Host header count");
            return Ok(Response::new(StatusCode::BAD_REQUEST));
        }

        match content_length(&request) {
            ContentLength::Invalid => return Ok(Response::new(StatusCode::BAD_REQUEST)),
            ContentLength::Declared(length) if length > self.max_body_size => {
                debug!(length, limit = self.max_body_size, "rejecting request: body too large");
                return Ok(Response::new(StatusCode::PAYLOAD_TOO_LARGE));
            }
            ContentLength::Declared(length) => {
                let body = cursor.read_exact(length).await?;
                request.set_body(body);
            }
            ContentLength::Absent => {}
        }

        if let Some(expectation) = request.headers().get_all(EXPECT).next() {
            // No interim 100 response is ever sent, so even 100-continue is refused.
            debug!(expectation, "rejecting request: unsupported expectation");
            return Ok(Response::new(StatusCode::EXPECTATION_FAILED));
        }

        let response = match request.method() {
            Method::Get => self.route(&request).await,
            Method::Head => {
                let mut response = self.route(&request).await;
                response.clear_body();
                response
            }
            _ => Response::new(StatusCode::NOT_IMPLEMENTED),
        };
        Ok(response)
    }

    async fn route(&self, request: &Request) -> Response {
        match self.router.claim(request).await {
            Some(response) => response,
            None => Response::new(StatusCode::NOT_FOUND),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContentLength {
    Absent,
    Declared(usize),
    /// Repeated, or not a non-negative integer that fits `usize`.
    Invalid,
}

fn content_length(request: &Request) -> ContentLength {
    let mut values = request.headers().get_all(CONTENT_LENGTH);
    let Some(value) = values.next() else {
        return ContentLength::Absent;
    };
    if values.next().is_some() || value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return ContentLength::Invalid;
    }
    value
        .parse()
        .map_or(ContentLength::Invalid, ContentLength::Declared)
}
