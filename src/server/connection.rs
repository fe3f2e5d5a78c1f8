//! One request/response exchange over a single byte-duplex connection.
//!
//! parse → dispatch → serialize → write → close. Nothing is written until a
//! complete response exists, so the peer sees either a well-formed response
//! or a close with no bytes at all.

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::time::{Instant, timeout};
use tracing::{debug, warn};

use super::ServerConfig;
use crate::dispatch::Dispatcher;
use crate::http::{ByteCursor, ParseError, Response, StatusCode, parser};
use crate::router::Router;

/// Reasons a connection closed without completing its exchange.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("failed to read request: {0}")]
    Parse(#[from] ParseError),

    #[error("write deadline elapsed")]
    WriteTimeout,

    #[error("failed to write response: {0}")]
    Io(#[from] std::io::Error),
}

/// Serves exactly one request on `stream` and shuts down its write half.
///
/// Malformed requests are answered with `400 Bad Request` and unsupported
/// request-target forms with `501 Not Implemented`. When the peer disconnects,
/// stalls past `read_timeout` or the body cannot be read, nothing is written.
///
/// Returns the status of the response that was written.
///
/// # Examples
///
/// ```
/// use h1serve::{Response, Router};
/// use h1serve::server::{serve_connection, ServerConfig};
/// use tokio::io::{AsyncReadExt, AsyncWriteExt};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut router = Router::new();
/// router.get("/", |_req| async { Response::ok("hi") });
///
/// let (mut client, server) = tokio::io::duplex(1024);
/// client.write_all(b"GET / HTTP/1.1\r\nHost: a\r\n\r\n").await.unwrap();
///
/// let status = serve_connection(server, &router, &ServerConfig::default()).await.unwrap();
/// assert_eq!(status.as_u16(), 200);
///
/// let mut out = String::new();
/// client.read_to_string(&mut out).await.unwrap();
/// assert_eq!(out, "HTTP/1.1 200 OK\r\n\r\nhi");
/// # }
/// ```
pub async fn serve_connection<S>(
    stream: S,
    router: &Router,
    config: &ServerConfig,
) -> Result<StatusCode, ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut cursor = ByteCursor::new(reader);
    cursor.set_deadline(Some(Instant::now() + config.read_timeout()));

    let response = match exchange(&mut cursor, router, config).await {
        Ok(response) => response,
        Err(e) if e.is_disconnect() => return Err(e.into()),
        Err(e) if e.is_unsupported() => {
            debug!(error = %e, "unsupported request");
            Response::new(StatusCode::NOT_IMPLEMENTED)
        }
        Err(e) => {
            warn!(error = %e, "malformed request");
            Response::new(StatusCode::BAD_REQUEST)
        }
    };

    let status = response.status();
    let bytes = response.to_bytes();
    timeout(config.write_timeout(), async {
        writer.write_all(&bytes).await?;
        writer.flush().await?;
        writer.shutdown().await
    })
    .await
    .map_err(|_| ConnectionError::WriteTimeout)??;

    Ok(status)
}

async fn exchange<R>(
    cursor: &mut ByteCursor<R>,
    router: &Router,
    config: &ServerConfig,
) -> Result<Response, ParseError>
where
    R: AsyncRead + Unpin,
{
    let request = parser::parse_message(cursor).await?;
    debug!(
        method = request.method_str(),
        path = %request.path(),
        version = %request.version(),
        "request parsed"
    );
    Dispatcher::new(router, config.max_body_size)
        .dispatch(request, cursor)
        .await
}
