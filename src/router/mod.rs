//! Route registration — an ordered list of predicates that may claim a request.
//!
//! Every registered entry is a [`Route`]: given the full request it either
//! claims it (returning a response) or declines with `None`. [`Router::claim`]
//! asks each route in registration order and the first claim wins.
//!
//! | Registration                     | Claims                                        |
//! |----------------------------------|-----------------------------------------------|
//! | `router.get("/users", h)`        | exactly the segments `["users"]`              |
//! | `router.get("/", h)`             | exactly the segments `[""]`                   |
//! | `router.get_segments(["a/b"], h)`| exactly one segment `a/b` (from `/a%2Fb`)     |
//! | `router.custom(route)`           | whatever `route` decides                      |
//!
//! There are no wildcards, parameters or prefix matches; a custom [`Route`]
//! covers anything beyond exact paths.
//!
//! Routes are only added while the `Router` is owned mutably. Once handed to
//! [`Server::serve`](crate::server::Server::serve) it is shared read-only.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::{Request, Response};

/// Boxed, `Send` future borrowed for `'a`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A try-claim predicate over requests.
///
/// # Contract
///
/// - Returning `None` means "not mine" and must have no observable side effect.
/// - Implementations are shared across connection tasks, so they must be
///   `Send + Sync`.
///
/// # Examples
///
/// ```rust
/// use h1serve::router::{BoxFuture, Route};
/// use h1serve::{Request, Response, StatusCode};
///
/// struct Teapot;
///
/// impl Route for Teapot {
///     fn try_claim<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Option<Response>> {
///         Box::pin(async move {
///             (request.segments() == ["coffee"]).then(|| Response::new(418u16))
///         })
///     }
/// }
/// ```
pub trait Route: Send + Sync + 'static {
    fn try_claim<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Option<Response>>;
}

/// Conversion trait for async handler functions.
///
/// Any `Fn(Request) -> impl Future<Output = Response> + Send` that is also
/// `Send + Sync + 'static` implements this trait automatically via the blanket
/// impl below.
pub trait IntoHandler: Send + Sync + 'static {
    /// Call the handler with the given request, boxing the returned future.
    fn call(&self, request: Request) -> BoxFuture<'static, Response>;
}

impl<T, F> IntoHandler for T
where
    T: Fn(Request) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    fn call(&self, request: Request) -> BoxFuture<'static, Response> {
        Box::pin((self)(request))
    }
}

/// Type-erased handler stored by [`ExactPath`].
pub type Handler = Arc<dyn IntoHandler>;

/// Claims a request iff its segments equal the registered ones exactly.
pub struct ExactPath {
    segments: Vec<String>,
    handler: Handler,
}

impl ExactPath {
    /// Builds a route from a path pattern such as `/users/list`.
    ///
    /// The leading `/` is dropped and the rest is split on `/`, so `/` becomes
    /// one empty segment and a trailing slash yields a trailing empty segment.
    pub fn new(pattern: &str, handler: impl IntoHandler) -> Self {
        Self::from_segments(split_pattern(pattern), handler)
    }

    /// Builds a route from already-decoded segments.
    pub fn from_segments<I, S>(segments: I, handler: impl IntoHandler) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
            handler: Arc::new(handler),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    fn matches(&self, request: &Request) -> bool {
        self.segments.as_slice() == request.segments()
    }
}

impl Route for ExactPath {
    fn try_claim<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Option<Response>> {
        if !self.matches(request) {
            return Box::pin(std::future::ready(None));
        }
        let response = self.handler.call(request.clone());
        Box::pin(async move { Some(response.await) })
    }
}

/// Adapts a synchronous `Fn(&Request) -> Option<Response>` into a [`Route`].
pub struct FnRoute<F>(F);

impl<F> Route for FnRoute<F>
where
    F: Fn(&Request) -> Option<Response> + Send + Sync + 'static,
{
    fn try_claim<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Option<Response>> {
        Box::pin(std::future::ready((self.0)(request)))
    }
}

fn split_pattern(pattern: &str) -> Vec<String> {
    let pattern = pattern.strip_prefix('/').unwrap_or(pattern);
    pattern.split('/').map(str::to_owned).collect()
}

/// Ordered, first-match-wins collection of [`Route`]s.
///
/// # Examples
///
/// ```rust
/// use h1serve::{Router, Response};
///
/// let mut router = Router::new();
/// router.get("/ping", |_req| async { Response::ok("pong") });
/// router.custom_fn(|req| (req.segments().len() > 3).then(|| Response::new(414u16)));
/// assert_eq!(router.len(), 2);
/// ```
#[derive(Default)]
pub struct Router {
    routes: Vec<Box<dyn Route>>,
}

impl Router {
    /// Create a new, empty `Router` with no registered routes.
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Register a handler for requests whose path equals `path` exactly.
    ///
    /// The route claims both `GET` and `HEAD`; the dispatcher strips the body
    /// for `HEAD`.
    pub fn get(&mut self, path: &str, handler: impl IntoHandler) -> &mut Self {
        self.custom(ExactPath::new(path, handler))
    }

    /// Register a handler for an exact list of decoded path segments.
    pub fn get_segments<I, S>(&mut self, segments: I, handler: impl IntoHandler) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.custom(ExactPath::from_segments(segments, handler))
    }

    /// Register an arbitrary route predicate.
    pub fn custom(&mut self, route: impl Route) -> &mut Self {
        self.routes.push(Box::new(route));
        self
    }

    /// Register a synchronous predicate closure.
    pub fn custom_fn<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&Request) -> Option<Response> + Send + Sync + 'static,
    {
        self.custom(FnRoute(predicate))
    }

    /// Return the number of routes registered in this router.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Offer `request` to each route in registration order.
    ///
    /// Returns the first claimed response unmodified, or `None` if every route declined.
    pub async fn claim(&self, request: &Request) -> Option<Response> {
        for route in &self.routes {
            if let Some(response) = route.try_claim(request).await {
                return Some(response);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::StatusCode;
    use crate::http::{ByteCursor, parser};

    async fn make_request(target: &str) -> Request {
        let raw = format!("GET {target} HTTP/1.1\r\nHost: localhost\r\n\r\n");
        let mut cursor = ByteCursor::new(raw.as_bytes());
        parser::parse_message(&mut cursor).await.unwrap()
    }

    // ── pattern splitting ─────────────────────────────────────────────────────

    #[test]
    fn split_root() {
        assert_eq!(split_pattern("/"), vec![""]);
    }

    #[test]
    fn split_nested_and_trailing() {
        assert_eq!(split_pattern("/a/b"), vec!["a", "b"]);
        assert_eq!(split_pattern("/a/"), vec!["a", ""]);
    }

    // ── ExactPath ─────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn exact_path_hit() {
        let route = ExactPath::new("/users/list", |_req| async { Response::ok("ok") });
        let claimed = route.try_claim(&make_request("/users/list").await).await;
        assert_eq!(claimed.unwrap().status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn exact_path_segment_count_mismatch() {
        let route = ExactPath::new("/users", |_req| async { Response::ok("ok") });
        assert!(route.try_claim(&make_request("/users/42").await).await.is_none());
        assert!(route.try_claim(&make_request("/").await).await.is_none());
    }

    #[tokio::test]
    async fn exact_path_no_prefix_or_trailing_slash_match() {
        let route = ExactPath::new("/users", |_req| async { Response::ok("ok") });
        assert!(route.try_claim(&make_request("/users/").await).await.is_none());
        assert!(route.try_claim(&make_request("/user").await).await.is_none());
    }

    #[tokio::test]
    async fn exact_path_encoded_slash() {
        let route = ExactPath::from_segments(["a/b"], |_req| async { Response::ok("ok") });
        assert!(route.try_claim(&make_request("/a%2Fb").await).await.is_some());
        assert!(route.try_claim(&make_request("/a/b").await).await.is_none());
    }

    #[tokio::test]
    async fn handler_receives_request() {
        let route = ExactPath::new("/echo", |req: Request| async move {
            Response::ok(req.query_string().unwrap_or_default().to_owned())
        });
        let response = route
            .try_claim(&make_request("/echo?hi").await)
            .await
            .unwrap();
        assert_eq!(&response.body_ref()[..], b"hi");
    }

    #[tokio::test]
    async fn declining_route_runs_no_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let route = ExactPath::new("/x", move |_req| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Response::ok("") }
        });
        assert!(route.try_claim(&make_request("/y").await).await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    // ── Router ────────────────────────────────────────────────────────────────

    #[test]
    fn router_starts_empty() {
        let router = Router::new();
        assert!(router.is_empty());
        assert_eq!(router.len(), 0);
        assert!(Router::default().is_empty());
    }

    #[tokio::test]
    async fn router_empty_claims_nothing() {
        let router = Router::new();
        assert!(router.claim(&make_request("/").await).await.is_none());
    }

    #[tokio::test]
    async fn router_first_matching_route_wins() {
        let mut router = Router::new();
        router
            .get("/path", |_req| async { Response::new(StatusCode::OK) })
            .get("/path", |_req| async { Response::new(StatusCode::ACCEPTED) });

        let res = router.claim(&make_request("/path").await).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn router_custom_predicate_in_order() {
        let mut router = Router::new();
        router
            .custom_fn(|req| {
                (req.segments().first().map(String::as_str) == Some("static"))
                    .then(|| Response::new(StatusCode::FORBIDDEN))
            })
            .get("/static/file", |_req| async { Response::ok("file") });

        let res = router
            .claim(&make_request("/static/file").await)
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        assert!(router.claim(&make_request("/other").await).await.is_none());
    }

    #[tokio::test]
    async fn router_claim_returns_response_unmodified() {
        let mut router = Router::new();
        router.get("/", |_req| async {
            Response::ok("body").header("X-One", "1")
        });
        let res = router.claim(&make_request("/").await).await.unwrap();
        assert_eq!(res, Response::ok("body").header("X-One", "1"));
    }
}
