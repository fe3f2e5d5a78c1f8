//! # h1serve
//!
//! An HTTP/1.1 server core built from raw bytes: a buffered lookahead cursor,
//! a recursive-descent grammar parser, a dispatch state machine that enforces
//! protocol invariants, and a deterministic response serializer.
//!
//! Applications register route predicates on a [`Router`] and hand it to a
//! [`Server`]; each accepted connection carries exactly one request/response
//! exchange and is then closed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use h1serve::{Response, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut router = Router::new();
//!     router.get("/", |_req| async { Response::ok("Hello, World!") });
//!
//!     let server = Server::bind("127.0.0.1:8080").await?;
//!     println!("Listening on http://{}", server.local_addr());
//!     server.serve(router).await?;
//!     Ok(())
//! }
//! ```

pub mod dispatch;
pub mod http;
pub mod router;
pub mod server;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use http::{Headers, Method, Request, Response, StatusCode, Version};
pub use router::{Route, Router};
pub use server::{Server, ServerConfig, ServerError};
