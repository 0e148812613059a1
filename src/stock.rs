//! Enrichment: attaching behaviour to items by path.
//!
//! After discovery, a pond is stocked with a list of `(regex, enrichment)`
//! pairs. Every item whose path matches a regex takes on that enrichment's
//! data provider, middleware and helpers. A matched page passes them on to
//! the fragments in its directory, so `_row.html` rendered on its own sees
//! the same data as the page that includes it.

use std::collections::BTreeMap;
use std::sync::Arc;

use minijinja::Value;
use regex::Regex;
use tracing::{debug, warn};

use crate::item::{ContentItem, DataProvider, Helper, ItemId, Kind};
use crate::middleware::Middleware;
use crate::pond::Pond;
use crate::request::Request;

/// Behaviour to attach to every item a regex matches.
#[derive(Clone, Default)]
pub struct Enrichment {
    data: Option<DataProvider>,
    middleware: Vec<Middleware>,
    helpers: BTreeMap<String, Helper>,
}

impl Enrichment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the data provider, seen by templates as `local`.
    pub fn data<F>(mut self, provider: F) -> Self
    where
        F: Fn(&Request) -> Value + Send + Sync + 'static,
    {
        self.data = Some(Arc::new(provider));
        self
    }

    /// Appends middleware, run in the order added.
    pub fn middleware(mut self, mw: Middleware) -> Self {
        self.middleware.push(mw);
        self
    }

    /// Registers a function callable from templates as `name(...)`.
    pub fn helper<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, minijinja::Error> + Send + Sync + 'static,
    {
        self.helpers.insert(name.into(), Arc::new(f));
        self
    }
}

/// Which regexes found something.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct StockReport {
    pub matched: Vec<String>,
    pub unmatched: Vec<String>,
}

impl ContentItem {
    /// Takes on an enrichment. A data provider already set is kept,
    /// middleware accumulates and a helper name already taken keeps its
    /// first function.
    pub(crate) fn gobble(&mut self, enrichment: &Enrichment) {
        if self.data.is_none() {
            self.data = enrichment.data.clone();
        }
        self.middleware.extend(enrichment.middleware.iter().cloned());
        for (name, helper) in &enrichment.helpers {
            self.helpers.entry(name.clone()).or_insert_with(|| Arc::clone(helper));
        }
    }
}

impl Pond {
    /// Applies each enrichment, in order, to every item whose path relative
    /// to the template root matches its regex. Regexes that match nothing
    /// are logged and reported.
    ///
    /// Call this before handing the pond to a router; compiled templates
    /// pick up helpers on first use only.
    pub fn stock(&mut self, enrichments: impl IntoIterator<Item = (Regex, Enrichment)>) -> StockReport {
        let mut report = StockReport::default();

        for (regex, enrichment) in enrichments {
            let targets = self.targets(&regex);
            if targets.is_empty() {
                warn!(regex = regex.as_str(), "enrichment matched no items");
                report.unmatched.push(regex.as_str().to_owned());
                continue;
            }

            for id in targets {
                debug!(regex = regex.as_str(), file = self.item(id).scoped_path(), "enriching");
                self.item_mut(id).gobble(&enrichment);
            }
            report.matched.push(regex.as_str().to_owned());
        }

        report
    }

    /// Items `regex` matches, plus the fragments beside any matched page.
    /// Each at most once.
    fn targets(&self, regex: &Regex) -> Vec<ItemId> {
        let mut targets: Vec<ItemId> = Vec::new();
        let mut push = |id: ItemId| {
            if !targets.contains(&id) {
                targets.push(id);
            }
        };

        for (id, item) in self.items() {
            if matches!(item.kind, Kind::System { .. }) || !regex.is_match(&item.scoped_path) {
                continue;
            }
            push(id);
            if item.kind == Kind::Page {
                for &sibling in &item.siblings {
                    if self.item(sibling).kind == Kind::Fragment {
                        push(sibling);
                    }
                }
            }
        }

        targets
    }
}
