//! Radix-tree request router.
//!
//! Two kinds of routes live here. Routes added with [`Router::on`] belong to
//! one HTTP method. Routes cast from a [`Pond`](crate::Pond) answer any
//! method, the way a page on disk does not care whether it was fetched with
//! GET or POST. Method routes are tried first.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use matchit::Router as MatchitRouter;
use tracing::warn;

use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;
use crate::response::Response;

/// The application router.
///
/// One radix tree per HTTP method plus one method-agnostic tree:
/// O(path-length) lookup. Build it once at startup, pass it to
/// [`Server::serve`](crate::Server::serve).
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    any: MatchitRouter<BoxedHandler>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), any: MatchitRouter::new() }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax, `req.param("name")` retrieves them:
    ///
    /// ```rust,no_run
    /// # use shoal::{Request, Response, Router};
    /// # use http::Method;
    /// # async fn submit(_: Request) -> Response { Response::text("") }
    /// Router::new().on(Method::POST, "/submit/{form}", submit);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with one already
    /// registered for `method`. Hand-written routes are a programming error
    /// to get wrong; routes discovered on disk are reported through
    /// [`Router::pond`] instead.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    /// Registers a handler for every method.
    pub(crate) fn insert_any(&mut self, pattern: &str, handler: BoxedHandler) -> Result<(), Error> {
        self.any.insert(pattern, handler).map_err(|source| Error::Route {
            pattern: pattern.to_owned(),
            source,
        })
    }

    pub(crate) fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let matched = self
            .routes
            .get(method)
            .and_then(|tree| tree.at(path).ok())
            .or_else(|| self.any.at(path).ok())?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }

    /// Routes one request and produces one response.
    ///
    /// Generic over the body so the server can pass hyper's `Incoming` and
    /// tests can pass a `Full<Bytes>`. Never fails: unknown paths are `404`,
    /// an unreadable body is `400`.
    pub async fn call<B>(&self, req: http::Request<B>) -> http::Response<Full<Bytes>>
    where
        B: hyper::body::Body,
        B::Error: std::fmt::Display,
    {
        let (parts, body) = req.into_parts();

        let Some((handler, params)) = self.lookup(&parts.method, parts.uri.path()) else {
            return Response::status(StatusCode::NOT_FOUND).into_inner();
        };

        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                warn!(path = parts.uri.path(), "reading request body: {e}");
                return Response::status(StatusCode::BAD_REQUEST).into_inner();
            }
        };

        handler.call(Request::new(parts, body, params)).await.into_inner()
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn hello(req: Request) -> String {
        format!("hello {}", req.param("name").unwrap_or("nobody"))
    }

    async fn send(router: &Router, method: Method, uri: &str) -> http::Response<Full<Bytes>> {
        let req = http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::new()))
            .unwrap();
        router.call(req).await
    }

    async fn body_of(res: http::Response<Full<Bytes>>) -> Bytes {
        res.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn method_routes_and_params() {
        let router = Router::new().on(Method::GET, "/hello/{name}", hello);

        let res = send(&router, Method::GET, "/hello/fish").await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_of(res).await, "hello fish");

        let res = send(&router, Method::POST, "/hello/fish").await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn method_routes_win_over_any() {
        let mut router = Router::new().on(Method::POST, "/page", |_req: Request| async { "posted" });
        let page = (|_req: Request| async { "page" }).into_boxed_handler();
        router.insert_any("/page", page).unwrap();

        assert_eq!(body_of(send(&router, Method::POST, "/page").await).await, "posted");
        assert_eq!(body_of(send(&router, Method::GET, "/page").await).await, "page");
        assert_eq!(body_of(send(&router, Method::DELETE, "/page").await).await, "page");
    }

    #[test]
    fn conflicting_any_route_is_an_error() {
        let mut router = Router::new();
        let h = || (|_req: Request| async { "x" }).into_boxed_handler();
        router.insert_any("/user/{id}", h()).unwrap();
        let err = router.insert_any("/user/{name}", h()).unwrap_err();
        assert!(matches!(err, Error::Route { ref pattern, .. } if pattern == "/user/{name}"));
    }
}
