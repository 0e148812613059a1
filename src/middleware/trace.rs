use std::time::Instant;

use tracing::{info, info_span, Instrument};

use super::{from_fn, Middleware, Next};
use crate::request::Request;

/// Per-request span with method, path, status and latency.
///
/// Attach it pond-wide so it wraps everything:
///
/// ```rust,no_run
/// # use shoal::{middleware, Pond, PondOptions};
/// let pond = Pond::new("templates", PondOptions::default().middleware(middleware::trace()));
/// ```
pub fn trace() -> Middleware {
    from_fn(|req: Request, next: Next| {
        let span = info_span!("request", method = %req.method(), path = %req.path());
        async move {
            let started = Instant::now();
            let res = next.run(req).await;
            info!(
                status = res.status_code().as_u16(),
                latency_us = started.elapsed().as_micros() as u64,
                "served",
            );
            res
        }
        .instrument(span)
    })
}
