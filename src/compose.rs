//! Composition: from an item and its scopes to something renderable.
//!
//! Every html file is one named template definition, its *coral*. A page or
//! fragment is rendered against a *reef*: the set of definitions it can see,
//! merged in this order, first name wins:
//!
//! 1. system fragments (built-ins, cannot be shadowed)
//! 2. fragments in the item's own directory
//! 3. global fragments
//! 4. the item itself
//!
//! So a local `_nav` beats a global `_nav`, and a page whose name was already
//! taken by a fragment fails to compose instead of silently rendering the
//! wrong thing. The reef is compiled into a template environment once and
//! kept on the item for every later request.

use std::collections::{BTreeMap, HashSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use minijinja::value::Rest;
use minijinja::{context, AutoEscape, Environment, Value};

use crate::error::Error;
use crate::item::{HeadTag, ItemId, Kind};
use crate::pond::Pond;
use crate::request::Request;

/// One named template definition: a template name and its source.
#[derive(Clone, Debug)]
pub struct Definition {
    name: Arc<str>,
    source: Arc<str>,
}

impl Definition {
    pub fn name(&self) -> &str { &self.name }
    pub fn source(&self) -> &str { &self.source }
}

/// The merged, deduplicated definitions backing one item, compiled.
pub struct Reef {
    definitions: Vec<Definition>,
    env: Environment<'static>,
}

impl std::fmt::Debug for Reef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl Reef {
    /// Definitions in merge order.
    pub fn definitions(&self) -> &[Definition] { &self.definitions }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(Definition::name)
    }

    /// Renders the definition called `name` with `ctx`.
    pub fn render(&self, name: &str, ctx: Value) -> Result<String, Error> {
        let template_err = |source| Error::Template { name: name.to_owned(), source };
        self.env.get_template(name).map_err(template_err)?.render(ctx).map_err(template_err)
    }
}

impl Pond {
    /// The item's own definition, read from disk on first use.
    pub fn coral(&self, id: ItemId) -> Result<Definition, Error> {
        let item = self.item(id);
        if let Some(def) = item.coral.get() {
            return Ok(def.clone());
        }

        let source: Arc<str> = match &item.kind {
            Kind::System { source } => Arc::clone(source),
            _ => {
                let bytes = std::fs::read(&item.path)
                    .map_err(|source| Error::NewItem { path: item.path.clone(), source })?;
                let text = String::from_utf8(bytes)
                    .map_err(|_| Error::NotUtf8 { path: item.path.clone() })?;
                Arc::from(text)
            }
        };
        let def = Definition { name: Arc::from(item.template_name.as_str()), source };

        Ok(item.coral.get_or_init(|| def).clone())
    }

    /// Merges and compiles everything `id` can see. Memoized per item.
    pub fn compose(&self, id: ItemId) -> Result<Arc<Reef>, Error> {
        let item = self.item(id);
        if let Some(reef) = item.reef.get() {
            return Ok(Arc::clone(reef));
        }

        let mut eaten: HashSet<String> = HashSet::new();
        let mut definitions = Vec::new();
        let mut eat = |candidate: ItemId, definitions: &mut Vec<Definition>| -> Result<(), Error> {
            let name = &self.item(candidate).template_name;
            if eaten.contains(name) {
                return Ok(());
            }
            definitions.push(self.coral(candidate)?);
            eaten.insert(name.clone());
            Ok(())
        };

        for &g in self.globals.values() {
            if matches!(self.item(g).kind, Kind::System { .. }) {
                eat(g, &mut definitions)?;
            }
        }

        let own = (item.kind == Kind::Fragment).then_some(id);
        for local in own.into_iter().chain(item.siblings.iter().copied()) {
            if self.item(local).kind == Kind::Fragment {
                eat(local, &mut definitions)?;
            }
        }

        for &g in self.globals.values() {
            if self.item(g).kind == Kind::Fragment {
                eat(g, &mut definitions)?;
            }
        }

        if definitions.iter().any(|d| d.name() == item.template_name) {
            if item.kind == Kind::Page {
                return Err(Error::DuplicateTemplate(item.template_name.clone()));
            }
        } else {
            definitions.push(self.coral(id)?);
        }

        // Template names carry no extension, so escaping cannot be keyed off them.
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        for def in &definitions {
            env.add_template_owned(def.name.to_string(), def.source.to_string())
                .map_err(|source| Error::Template { name: def.name.to_string(), source })?;
        }
        for (name, helper) in &item.helpers {
            let helper = Arc::clone(helper);
            env.add_function(name.clone(), move |args: Rest<Value>| helper(args.as_slice()));
        }

        let reef = Arc::new(Reef { definitions, env });
        Ok(Arc::clone(item.reef.get_or_init(|| reef)))
    }

    /// The `<link>`/`<script>` block for a page's head. Memoized per item.
    ///
    /// Global assets first, then the page's own directory; one tag per
    /// pattern, ordered by pattern so stylesheet precedence never depends on
    /// discovery or map order.
    pub fn head_links(&self, id: ItemId) -> Arc<str> {
        let item = self.item(id);
        if let Some(head) = item.head.get() {
            return Arc::clone(head);
        }

        let mut tags: BTreeMap<&str, String> = BTreeMap::new();
        for &candidate in self.globals.values().chain(item.siblings.iter()) {
            let asset = self.item(candidate);
            let Kind::StyleOrScript(tag) = asset.kind else { continue };
            tags.entry(asset.pattern.as_str()).or_insert_with(|| match tag {
                HeadTag::Stylesheet => {
                    format!(r#"<link rel="stylesheet" href="{}?v={}">"#, asset.pattern, asset.hash)
                }
                HeadTag::Script => {
                    format!(r#"<script src="{}?v={}"></script>"#, asset.pattern, asset.hash)
                }
            });
        }

        let head: Arc<str> = Arc::from(tags.into_values().collect::<String>());
        Arc::clone(item.head.get_or_init(|| head))
    }

    /// Renders `id` for `req`. The template sees the item's data as `local`
    /// and the pond's data as `global`.
    pub(crate) fn render(&self, id: ItemId, req: &Request) -> Result<String, Error> {
        let item = self.item(id);
        let reef = self.compose(id)?;

        let provide = |provider: Option<&crate::item::DataProvider>| -> Result<Value, Error> {
            let Some(provider) = provider else { return Ok(Value::UNDEFINED) };
            catch_unwind(AssertUnwindSafe(|| provider(req)))
                .map_err(|_| Error::DataPanic(item.template_name.clone()))
        };
        let local = provide(item.data.as_ref())?;
        let global = provide(self.data.as_ref())?;

        reef.render(&item.template_name, context! { local => local, global => global })
    }
}
