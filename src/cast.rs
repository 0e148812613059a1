//! Casting a pond into a router.
//!
//! Every row of [`Pond::routes`] becomes one method-agnostic route. Its
//! handler is the item's endpoint wrapped in the pond's middleware, then
//! the item's own.

use std::sync::Arc;

use tracing::info;

use crate::endpoint;
use crate::error::Error;
use crate::middleware::chain;
use crate::pond::Pond;
use crate::router::Router;

impl Router {
    /// Registers a route for every servable item in `pond`.
    ///
    /// The pond is frozen from here on: it is shared read-only by every
    /// handler. Two items mapping to conflicting patterns fail here rather
    /// than at request time.
    pub fn pond(mut self, pond: Pond) -> Result<Self, Error> {
        let routes = pond.routes();
        let pond = Arc::new(pond);

        for route in routes {
            let item = pond.item(route.id);
            let handler = chain(
                endpoint::for_item(&pond, route.id),
                pond.middleware.iter().chain(item.middleware.iter()),
            );
            self.insert_any(&route.pattern, handler)?;
            info!(kind = route.kind, pattern = %route.pattern, file = %route.file, "route");
        }

        Ok(self)
    }
}
