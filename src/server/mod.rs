//! Async TCP server using Tokio.
//!
//! Accepts TCP connections and serves one HTTP/1.1 exchange per connection,
//! each on its own task. Concurrency is bounded by `max_connections`: the
//! accept loop waits for a free slot before taking the next connection.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::router::Router;

mod config;
mod connection;

pub use config::{ConfigError, ServerConfig};
pub use connection::{ConnectionError, serve_connection};

/// Errors produced by the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// The h1serve HTTP server.
///
/// # Examples
///
/// ```rust,no_run
/// use h1serve::{Response, Router, Server};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut router = Router::new();
///     router.get("/", |_req| async { Response::ok("Hello!") });
///
///     let server = Server::bind("127.0.0.1:8080").await?;
///     server.serve(router).await?;
///     Ok(())
/// }
/// ```
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    config: ServerConfig,
}

impl Server {
    /// Binds the server to the given TCP address with default limits.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound
    /// (e.g. port already in use, insufficient permissions).
    pub async fn bind(addr: impl AsRef<str>) -> Result<Self, ServerError> {
        let config = ServerConfig {
            bind_address: addr.as_ref().to_owned(),
            ..ServerConfig::default()
        };
        Self::bind_with(config).await
    }

    /// Validates `config` and binds to its `bind_address`.
    pub async fn bind_with(config: ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;
        let addr = config.bind_address.as_str();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.to_owned(),
                source: e,
            })?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
            config,
        })
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serves connections forever.
    ///
    /// The router is frozen from here on: it is shared read-only by every
    /// connection task.
    pub async fn serve(self, router: Router) -> Result<(), ServerError> {
        self.serve_with_shutdown(router, std::future::pending()).await
    }

    /// Serves connections until `signal` resolves.
    ///
    /// Connections already accepted keep running on their own tasks. A failed
    /// `accept` is logged and the loop carries on.
    pub async fn serve_with_shutdown<F>(self, router: Router, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send,
    {
        let router = Arc::new(router);
        let config = Arc::new(self.config);
        let slots = Arc::new(Semaphore::new(config.max_connections));
        info!(address = %self.local_addr, routes = router.len(), "h1serve listening");

        tokio::pin!(signal);
        loop {
            let permit = tokio::select! {
                () = &mut signal => break,
                permit = Arc::clone(&slots).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let (stream, peer_addr) = tokio::select! {
                () = &mut signal => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        error!(error = %e, "failed to accept connection");
                        continue;
                    }
                },
            };

            debug!(peer = %peer_addr, "connection accepted");
            let router = Arc::clone(&router);
            let config = Arc::clone(&config);

            tokio::spawn(async move {
                let _permit = permit;
                handle_connection(stream, peer_addr, &router, &config).await;
            });
        }

        info!(address = %self.local_addr, "h1serve stopped accepting connections");
        Ok(())
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    router: &Router,
    config: &ServerConfig,
) {
    match serve_connection(stream, router, config).await {
        Ok(status) => debug!(peer = %peer_addr, status = status.as_u16(), "response sent"),
        Err(ConnectionError::Parse(e)) if e.is_disconnect() => {
            debug!(peer = %peer_addr, error = %e, "connection closed before a response")
        }
        Err(e) => warn!(peer = %peer_addr, error = %e, "connection closed with error"),
    }
}
