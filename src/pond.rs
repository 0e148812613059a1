//! The pond: every item discovered under one template root.
//!
//! A pond is built once at startup, enriched, then handed to
//! [`Router::pond`](crate::Router::pond) which freezes it behind an `Arc`
//! shared by every request. Nothing in it is a process-wide singleton; two
//! ponds (or two routers) in one process do not see each other unless one
//! [flows into](Pond::flows_into) the other.
//!
//! ```rust,no_run
//! use shoal::{Pond, PondOptions, Router};
//!
//! # fn main() -> Result<(), shoal::Error> {
//! let assets = Pond::new("assets", PondOptions::default().promote_all(true))?;
//! let mut pages = Pond::new("templates", PondOptions::default())?;
//! assets.flows_into(&mut pages);
//!
//! let router = Router::new().pond(pages)?;
//! # Ok(()) }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use minijinja::Value;
use tracing::{info, warn};

use crate::error::Error;
use crate::item::{ContentItem, ItemId, Kind};
use crate::middleware::Middleware;
use crate::request::Request;
use crate::scan::scan_dir;
use crate::scope::Scope;

/// Options for [`Pond::new`].
#[derive(Clone, Default)]
pub struct PondOptions {
    promote_all: bool,
    middleware: Vec<Middleware>,
}

impl PondOptions {
    /// Makes every fragment and asset global, wherever it sits. Useful for
    /// an asset pond that flows into a page pond.
    pub fn promote_all(mut self, yes: bool) -> Self {
        self.promote_all = yes;
        self
    }

    /// Adds pond-wide middleware. It runs before any item's own middleware,
    /// in the order added.
    pub fn middleware(mut self, mw: Middleware) -> Self {
        self.middleware.push(mw);
        self
    }
}

/// One row of the routing table a pond produces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    pub id: ItemId,
    pub kind: &'static str,
    pub pattern: String,
    pub file: String,
}

/// Every item discovered under one template root.
pub struct Pond {
    pub(crate) root: PathBuf,
    pub(crate) items: Vec<ContentItem>,
    pub(crate) dirs: BTreeMap<PathBuf, Vec<ItemId>>,
    pub(crate) globals: BTreeMap<String, ItemId>,
    pub(crate) middleware: Vec<Middleware>,
    pub(crate) data: Option<crate::item::DataProvider>,
    promote_all: bool,
}

impl Pond {
    /// Scans `dir` (relative paths resolve against the working directory).
    pub fn new(dir: impl AsRef<Path>, options: PondOptions) -> Result<Self, Error> {
        let root = std::env::current_dir()?.join(dir.as_ref());
        if !root.is_dir() {
            return Err(Error::NoTemplateDirectory(root));
        }

        let mut pond = Self {
            root: root.clone(),
            items: Vec::new(),
            dirs: BTreeMap::new(),
            globals: BTreeMap::new(),
            middleware: options.middleware,
            data: None,
            promote_all: options.promote_all,
        };

        match scan_dir(&root, &root) {
            Ok(visit) => pond.collect(visit)?,
            Err(Error::Io(_)) => return Err(Error::NoTemplateDirectory(root)),
            Err(e) => return Err(e),
        }

        info!(root = %pond.root.display(), items = pond.items.len(), globals = pond.globals.len(), "pond filled");
        Ok(pond)
    }

    /// Files one directory's items, then descends into its subdirectories.
    fn collect(&mut self, visit: crate::scan::Visit) -> Result<(), Error> {
        let at_root = visit.dir == self.root;

        let first = self.items.len();
        let ids: Vec<ItemId> = (first..first + visit.items.len()).map(ItemId).collect();
        let small: Vec<ItemId> = visit
            .items
            .iter()
            .zip(&ids)
            .filter(|(item, _)| item.kind != Kind::Page)
            .map(|(_, &id)| id)
            .collect();

        for (mut item, &id) in visit.items.into_iter().zip(&ids) {
            item.siblings = small.iter().copied().filter(|&s| s != id).collect();
            if Scope::resolve(&item.kind, at_root, self.promote_all) == Scope::Global {
                self.globals.insert(item.path.to_string_lossy().into_owned(), id);
            }
            self.items.push(item);
        }
        self.dirs.insert(visit.dir, ids);

        for sub in visit.subdirs {
            match scan_dir(&self.root, &sub) {
                Ok(visit) => self.collect(visit)?,
                Err(Error::Io(e)) => warn!(dir = %sub.display(), "skipping unreadable directory: {e}"),
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Sets the pond-wide data provider, seen by templates as `global`.
    pub fn set_data<F>(&mut self, provider: F)
    where
        F: Fn(&Request) -> Value + Send + Sync + 'static,
    {
        self.data = Some(Arc::new(provider));
    }

    /// Registers a built-in fragment. It is composed into every page ahead
    /// of any file-backed fragment and cannot be requested directly.
    pub fn add_system_fragment(&mut self, name: &str, source: &str) -> ItemId {
        let item = ContentItem::system(name, source);
        let key = item.path.to_string_lossy().into_owned();
        let id = self.push(item);
        self.globals.insert(key, id);
        id
    }

    /// Copies this pond's global items into `other`'s global set.
    pub fn flows_into(&self, other: &mut Pond) {
        for (key, &id) in &self.globals {
            let copy = self.item(id).detached();
            let new_id = other.push(copy);
            other.globals.insert(key.clone(), new_id);
        }
    }

    fn push(&mut self, item: ContentItem) -> ItemId {
        let id = ItemId(self.items.len());
        self.items.push(item);
        id
    }

    pub fn root(&self) -> &Path { &self.root }

    /// # Panics
    ///
    /// Panics if `id` came from another pond.
    pub fn item(&self, id: ItemId) -> &ContentItem { &self.items[id.0] }

    pub(crate) fn item_mut(&mut self, id: ItemId) -> &mut ContentItem { &mut self.items[id.0] }

    pub fn items(&self) -> impl Iterator<Item = (ItemId, &ContentItem)> {
        self.items.iter().enumerate().map(|(i, item)| (ItemId(i), item))
    }

    /// Looks an item up by its path relative to the template root.
    pub fn find(&self, scoped_path: &str) -> Option<ItemId> {
        self.items().find(|(_, item)| item.scoped_path == scoped_path).map(|(id, _)| id)
    }

    /// Ids of every globally visible item, ordered by path.
    pub fn globals(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.globals.values().copied()
    }

    /// Ids of the items found directly inside `dir`.
    pub fn dir(&self, dir: &Path) -> &[ItemId] {
        self.dirs.get(dir).map(Vec::as_slice).unwrap_or_default()
    }

    /// The routing table: global fragments and assets, then every page with
    /// its siblings. A pattern seen twice keeps its last item. Ordered by
    /// pattern, descending.
    pub fn routes(&self) -> Vec<Route> {
        let mut table: BTreeMap<&str, ItemId> = BTreeMap::new();

        for id in self.globals() {
            let item = self.item(id);
            if item.kind != Kind::Page {
                table.insert(&item.pattern, id);
            }
        }

        for ids in self.dirs.values() {
            for &id in ids {
                let page = self.item(id);
                if page.kind != Kind::Page {
                    continue;
                }
                table.insert(&page.pattern, id);
                for &sibling in &page.siblings {
                    table.insert(&self.item(sibling).pattern, sibling);
                }
            }
        }

        table
            .into_iter()
            .rev()
            .filter(|(pattern, _)| !pattern.is_empty())
            .map(|(pattern, id)| {
                let item = self.item(id);
                Route {
                    id,
                    kind: item.kind.label(),
                    pattern: pattern.to_owned(),
                    file: item.scoped_path.clone(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::item::HeadTag;

    fn tree(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (rel, body) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }
        dir
    }

    #[test]
    fn missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = Pond::new(dir.path().join("nope"), PondOptions::default()).err().unwrap();
        assert!(matches!(err, Error::NoTemplateDirectory(_)));
    }

    #[test]
    fn root_items_are_global_nested_are_local() {
        let dir = tree(&[
            ("_footer.html", "f"),
            ("site.css", "a{}"),
            ("index.html", "home"),
            ("blog/_aside.html", "aside"),
            ("blog/blog.html", "blog"),
        ]);
        let pond = Pond::new(dir.path(), PondOptions::default()).unwrap();

        let globals: Vec<_> = pond.globals().map(|id| pond.item(id).scoped_path()).collect();
        assert_eq!(globals, ["_footer.html", "site.css"]);

        let blog = pond.find("blog/blog.html").unwrap();
        let aside = pond.find("blog/_aside.html").unwrap();
        assert_eq!(pond.item(blog).siblings(), [aside]);
        assert!(pond.item(aside).siblings().is_empty());
        assert_eq!(pond.dir(&dir.path().join("blog")).len(), 2);
    }

    #[test]
    fn promote_all_makes_nested_items_global() {
        let dir = tree(&[("fonts/a.woff2", "wOF2"), ("css/x.css", "x{}"), ("css/page.html", "p")]);
        let pond = Pond::new(dir.path(), PondOptions::default().promote_all(true)).unwrap();
        let kinds: Vec<_> = pond.globals().map(|id| pond.item(id).kind().clone()).collect();
        assert_eq!(kinds, [Kind::StyleOrScript(HeadTag::Stylesheet), Kind::Media]);
    }

    #[test]
    fn flows_into_shares_globals() {
        let assets = tree(&[("theme.css", "t{}"), ("_brand.html", "brand")]);
        let pages = tree(&[("index.html", r#"{% include "_brand" %}"#)]);

        let assets = Pond::new(assets.path(), PondOptions::default().promote_all(true)).unwrap();
        let mut pages = Pond::new(pages.path(), PondOptions::default()).unwrap();
        assets.flows_into(&mut pages);

        assert_eq!(pages.globals().count(), 2);
        let index = pages.find("index.html").unwrap();
        let out = pages.render(index, &crate::request::for_test("/")).unwrap();
        assert_eq!(out, "brand");
        assert!(pages.head_links(index).contains(".css?v="));
    }

    #[test]
    fn routes_are_descending_and_deduplicated() {
        let dir = tree(&[
            ("index.html", "home"),
            ("about.html", "about"),
            ("_footer.html", "footer"),
            ("user/user.id.html", "user"),
            ("user/user.html", "users"),
            ("user/_row.html", "row"),
        ]);
        let pond = Pond::new(dir.path(), PondOptions::default()).unwrap();
        let patterns: Vec<_> = pond.routes().into_iter().map(|r| r.pattern).collect();
        assert_eq!(patterns, ["/user/{id}", "/user/_row", "/user", "/about", "/_footer", "/"]);
    }

    #[test]
    fn fragments_without_pages_stay_unrouted() {
        let dir = tree(&[("index.html", "home"), ("parts/_orphan.html", "orphan")]);
        let pond = Pond::new(dir.path(), PondOptions::default()).unwrap();
        assert!(pond.routes().iter().all(|r| r.file != "parts/_orphan.html"));
    }
}
