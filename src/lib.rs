//! # shoal
//!
//! Point it at a directory of templates and assets; every file becomes a
//! route.
//!
//! ## The contract
//!
//! The directory *is* the site map. shoal walks it once at startup, decides
//! what each file is, gives it a route and builds a handler for it:
//!
//! | On disk | Kind | Route |
//! |---|---|---|
//! | `index.html` | page | `/` |
//! | `about.html` | page | `/about` |
//! | `blog/blog.html` | page (landing) | `/blog` |
//! | `user/user.id.html` | page | `/user/{id}` |
//! | `_footer.html` | fragment | `/_footer` |
//! | `site.css` | stylesheet | `/<blake3 of contents>.css` |
//! | `img/logo.png` | media | `/img/logo.png` |
//!
//! Pages are rendered inside an html skeleton whose head links every
//! stylesheet and script the page can see, with `?v=<hash>` cache keys.
//! Fragments (`_`-prefixed) are composed into pages with
//! `{% include "_footer" %}` and can also be fetched on their own for
//! partial updates. A fragment next to a page beats a root fragment of the
//! same name.
//!
//! Templates are [minijinja](https://docs.rs/minijinja). Data, middleware
//! and template helpers are attached after discovery by matching file paths
//! against regexes, see [`Pond::stock`].
//!
//! What shoal does not do: TLS, compression, hot reload. Restart to pick up
//! changed files.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use http::Method;
//! use minijinja::context;
//! use regex::Regex;
//! use shoal::{middleware, Enrichment, Pond, PondOptions, Request, Response, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), shoal::Error> {
//!     let mut pond = Pond::new("templates", PondOptions::default().middleware(middleware::trace()))?;
//!     pond.stock([(
//!         Regex::new(r"user/user\.id\.html$").unwrap(),
//!         Enrichment::new().data(|req| context! { id => req.param("id") }),
//!     )]);
//!
//!     let app = Router::new()
//!         .pond(pond)?
//!         .on(Method::POST, "/subscribe", subscribe);
//!
//!     Server::bind(([0, 0, 0, 0], 3000).into()).serve(app).await
//! }
//!
//! async fn subscribe(req: Request) -> Response {
//!     match req.query("email") {
//!         Some(_) => Response::html("<p>thanks</p>"),
//!         None => Response::status(http::StatusCode::BAD_REQUEST),
//!     }
//! }
//! ```

mod cast;
mod compose;
mod endpoint;
mod error;
mod handler;
mod item;
mod mime;
mod pond;
mod request;
mod response;
mod router;
mod scan;
mod scope;
mod server;
mod stock;

pub mod middleware;
pub mod pattern;

pub use compose::{Definition, Reef};
pub use error::Error;
pub use handler::{BoxFuture, BoxedHandler, ErasedHandler, Handler};
pub use item::{ContentItem, DataProvider, FRAGMENT_MARKER, HeadTag, Helper, ItemId, Kind};
pub use pond::{Pond, PondOptions, Route};
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use scan::{scan_dir, Visit};
pub use scope::Scope;
pub use server::Server;
pub use stock::{Enrichment, StockReport};
