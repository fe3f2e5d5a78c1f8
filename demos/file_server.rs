//! Serves files below the current directory.
//!
//! ```text
//! RUST_LOG=debug cargo run --example file_server -- '{"bind_address":"127.0.0.1:8000"}'
//! ```

use std::path::{Path, PathBuf};

use h1serve::router::{BoxFuture, Route};
use h1serve::{Request, Response, Router, Server, ServerConfig, StatusCode};
use tracing_subscriber::EnvFilter;

/// Claims every request and answers from the file tree under `root`.
struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    // Segments containing a decoded `/` or dot-segments never reach the filesystem.
    fn resolve(&self, segments: &[String]) -> Option<PathBuf> {
        let mut path = self.root.clone();
        for segment in segments {
            if segment.contains('/') || segment == "." || segment == ".." {
                return None;
            }
            path.push(segment);
        }
        Some(path)
    }
}

impl Route for StaticFiles {
    fn try_claim<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Option<Response>> {
        Box::pin(async move {
            let Some(path) = self.resolve(request.segments()) else {
                return Some(Response::new(StatusCode::FORBIDDEN));
            };
            let response = match tokio::fs::read(&path).await {
                Ok(contents) => Response::new(StatusCode::OK)
                    .header("Content-Length", contents.len().to_string())
                    .body_bytes(contents),
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "file not served");
                    Response::new(StatusCode::NOT_FOUND)
                }
            };
            Some(response)
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(json) => ServerConfig::from_json(&json)?,
        None => ServerConfig::default(),
    };

    let mut router = Router::new();
    router.custom(StaticFiles {
        root: Path::new(".").to_path_buf(),
    });

    let server = Server::bind_with(config).await?;
    tracing::info!("serving files on http://{}", server.local_addr());
    server
        .serve_with_shutdown(router, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
