//! Per-kind request handlers for discovered items.
//!
//! Every route a pond contributes ends in one of these. Pages render inside
//! the document skeleton, fragments render bare (for partial swaps), assets
//! stream from disk. Failures are logged here and answered with a bare
//! status; nothing about the cause reaches the client.

use std::io::ErrorKind;
use std::sync::Arc;

use http::header::{self, HeaderName};
use http::StatusCode;
use tracing::{error, warn};

use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::item::{ItemId, Kind};
use crate::pond::Pond;
use crate::request::Request;
use crate::response::Response;

const PROLOGUE: &str = concat!(
    "<!DOCTYPE html><html lang=\"en\">\n",
    "<head>\n",
    "    <meta charset=\"UTF-8\">\n",
    "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\" >",
);
const BODY_OPEN: &str = "\n</head>\n<body>";
const EPILOGUE: &str = "</body></html>";

const NO_STORE: &str = "no-store";
const CACHE_A_DAY: &str = "public, max-age=86400";

/// Builds the handler serving item `id` of `pond`.
pub(crate) fn for_item(pond: &Arc<Pond>, id: ItemId) -> BoxedHandler {
    let pond = Arc::clone(pond);
    match pond.item(id).kind() {
        Kind::Page => Arc::new(PageEndpoint { pond, id }),
        Kind::Fragment => Arc::new(FragmentEndpoint { pond, id }),
        Kind::StyleOrScript(_) => Arc::new(AssetEndpoint { pond, id, versioned: true }),
        Kind::Media => Arc::new(AssetEndpoint { pond, id, versioned: false }),
        Kind::System { .. } => Arc::new(NotServable),
    }
}

fn internal_error() -> Response {
    Response::builder().status(StatusCode::INTERNAL_SERVER_ERROR).text("internal server error")
}

fn fresh(body: String) -> Response {
    Response::builder().header(header::CACHE_CONTROL, NO_STORE).html(body)
}

struct PageEndpoint {
    pond: Arc<Pond>,
    id: ItemId,
}

impl ErasedHandler for PageEndpoint {
    fn call(&self, req: Request) -> BoxFuture {
        let pond = Arc::clone(&self.pond);
        let id = self.id;
        Box::pin(async move {
            let body = match pond.render(id, &req) {
                Ok(body) => body,
                Err(e) => {
                    error!(file = pond.item(id).scoped_path(), "rendering page: {e}");
                    return internal_error();
                }
            };
            let head = pond.head_links(id);

            let mut doc = String::with_capacity(PROLOGUE.len() + head.len() + body.len() + 64);
            doc.push_str(PROLOGUE);
            doc.push_str(&head);
            doc.push_str(BODY_OPEN);
            doc.push_str(&body);
            doc.push_str(EPILOGUE);
            fresh(doc)
        })
    }
}

struct FragmentEndpoint {
    pond: Arc<Pond>,
    id: ItemId,
}

impl ErasedHandler for FragmentEndpoint {
    fn call(&self, req: Request) -> BoxFuture {
        let pond = Arc::clone(&self.pond);
        let id = self.id;
        Box::pin(async move {
            match pond.render(id, &req) {
                Ok(body) => fresh(body),
                Err(e) => {
                    error!(file = pond.item(id).scoped_path(), "rendering fragment: {e}");
                    internal_error()
                }
            }
        })
    }
}

/// Serves a file's bytes. Versioned assets answer `404` unless the `v` query
/// parameter names the current content hash, so a stale page never gets
/// served a newer stylesheet under an old cache key.
struct AssetEndpoint {
    pond: Arc<Pond>,
    id: ItemId,
    versioned: bool,
}

impl ErasedHandler for AssetEndpoint {
    fn call(&self, req: Request) -> BoxFuture {
        let pond = Arc::clone(&self.pond);
        let id = self.id;
        let versioned = self.versioned;
        Box::pin(async move {
            let item = pond.item(id);

            if versioned && req.query("v").as_deref() != Some(item.hash()) {
                return Response::status(StatusCode::NOT_FOUND);
            }

            match tokio::fs::read(item.path()).await {
                Ok(bytes) => Response::builder()
                    .header(header::CACHE_CONTROL, CACHE_A_DAY)
                    .header(HeaderName::from_static("x-content-hash"), item.hash())
                    .bytes(item.mime(), bytes),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    warn!(file = item.scoped_path(), "asset vanished from disk");
                    Response::status(StatusCode::NOT_FOUND)
                }
                Err(e) => {
                    error!(file = item.scoped_path(), "reading asset: {e}");
                    internal_error()
                }
            }
        })
    }
}

/// System fragments have a route so they show up in the table, but nobody
/// may fetch them.
struct NotServable;

impl ErasedHandler for NotServable {
    fn call(&self, _req: Request) -> BoxFuture {
        Box::pin(async { Response::status(StatusCode::NOT_ACCEPTABLE) })
    }
}
