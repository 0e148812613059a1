//! Minimal shoal example: a template directory, one enrichment and one
//! hand-written route.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic -- path/to/templates
//!
//! A directory like
//!
//!   templates/index.html          {% include "_greeting" %}
//!   templates/_greeting.html      <p>hello {{ global.visitor }}</p>
//!   templates/user/user.id.html   <h1>user {{ local.id }}</h1>
//!   templates/site.css
//!
//! then answers:
//!   curl http://localhost:3000/
//!   curl http://localhost:3000/user/42
//!   curl http://localhost:3000/_greeting
//!   curl -X POST 'http://localhost:3000/subscribe?email=a@b.c'

use http::Method;
use minijinja::context;
use regex::Regex;
use shoal::{middleware, Enrichment, Pond, PondOptions, Request, Response, Router, Server};

#[tokio::main]
async fn main() -> Result<(), shoal::Error> {
    tracing_subscriber::fmt::init();

    let dir = std::env::args().nth(1).unwrap_or_else(|| "templates".to_owned());

    let mut pond = Pond::new(dir, PondOptions::default().middleware(middleware::trace()))?;
    pond.set_data(|req| context! { visitor => req.query("name").unwrap_or_else(|| "stranger".into()) });
    pond.add_system_fragment("_powered_by", "<small>served by shoal</small>");
    pond.stock([(
        Regex::new(r"user\.id\.html$").expect("static regex"),
        Enrichment::new()
            .data(|req| context! { id => req.param("id") })
            .helper("shout", |args| Ok(args.first().map(|v| v.to_string().to_uppercase()).unwrap_or_default().into())),
    )]);

    let app = Router::new()
        .pond(pond)?
        .on(Method::POST, "/subscribe", subscribe);

    Server::bind(([0, 0, 0, 0], 3000).into()).serve(app).await
}

// POST /subscribe?email=...
async fn subscribe(req: Request) -> Response {
    match req.query("email") {
        Some(email) => Response::text(format!("subscribed {email}")),
        None => Response::status(http::StatusCode::BAD_REQUEST),
    }
}
