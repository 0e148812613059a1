//! Middleware layer.
//!
//! Middleware wraps a handler with behaviour before and after it runs:
//! tracing, authentication, header rewriting. A [`Middleware`] is a function
//! from the next handler to a new handler. Ponds attach pond-wide middleware
//! (outermost) and per-item middleware from enrichment; [`chain`] nests them:
//!
//! ```text
//! chain(endpoint, [A, B])  ==  A(B(endpoint))
//! ```
//!
//! Most middleware is easiest to write with [`from_fn`]:
//!
//! ```rust
//! use shoal::middleware::{self, Next};
//! use shoal::{Request, Response};
//! use http::StatusCode;
//!
//! let require_user = middleware::from_fn(|req: Request, next: Next| async move {
//!     if req.header("x-user").is_none() {
//!         return Response::status(StatusCode::UNAUTHORIZED);
//!     }
//!     next.run(req).await
//! });
//! ```
//!
//! Built-in middleware:
//! - [`trace`]: a per-request span recording method, path, status and latency

mod trace;

pub use trace::trace;

use std::future::Future;
use std::sync::Arc;

use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// A handler decorator: receives the next handler, returns the wrapped one.
pub type Middleware = Arc<dyn Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static>;

/// The rest of the chain, handed to a [`from_fn`] middleware.
pub struct Next(BoxedHandler);

impl Next {
    /// Runs the remaining middleware and the endpoint.
    pub async fn run(self, req: Request) -> Response {
        self.0.call(req).await
    }
}

/// Builds a [`Middleware`] from an `async fn(Request, Next) -> impl IntoResponse`.
pub fn from_fn<F, Fut, R>(f: F) -> Middleware
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    let f = Arc::new(f);
    Arc::new(move |next: BoxedHandler| -> BoxedHandler {
        Arc::new(FromFn { f: Arc::clone(&f), next })
    })
}

struct FromFn<F> {
    f: Arc<F>,
    next: BoxedHandler,
}

impl<F, Fut, R> ErasedHandler for FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.f)(req, Next(Arc::clone(&self.next)));
        Box::pin(async move { fut.await.into_response() })
    }
}

/// Wraps `endpoint` so that `layers[0]` runs first and the endpoint last.
pub fn chain<'a>(
    endpoint: BoxedHandler,
    layers: impl DoubleEndedIterator<Item = &'a Middleware>,
) -> BoxedHandler {
    layers.rev().fold(endpoint, |next, layer| layer(next))
}
