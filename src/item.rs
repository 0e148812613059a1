//! Content items: one discovered file each.
//!
//! An item knows what it is ([`Kind`]), where it lives, which route it
//! answers on and what it hashes to. Everything derived from it at request
//! time (its own template definition, the merged definition set, the head
//! block of a page) is computed once and cached in single-assignment cells,
//! so concurrent first requests are safe and later ones are cheap.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use minijinja::Value;

use crate::compose::{Definition, Reef};
use crate::error::Error;
use crate::middleware::Middleware;
use crate::pattern;
use crate::request::Request;

/// Filenames starting with this are fragments, not pages.
pub const FRAGMENT_MARKER: char = '_';

/// Produces template data for a request.
pub type DataProvider = Arc<dyn Fn(&Request) -> Value + Send + Sync + 'static>;

/// A function callable from inside a template.
pub type Helper = Arc<dyn Fn(&[Value]) -> Result<Value, minijinja::Error> + Send + Sync + 'static>;

/// Index of an item inside its [`Pond`](crate::Pond).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(pub(crate) usize);

/// Which tag a head asset is linked with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeadTag {
    Stylesheet,
    Script,
}

/// What a discovered item is, and therefore how it is served.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Kind {
    /// An html document served whole, wrapped in the page skeleton.
    Page,
    /// An `_`-prefixed html partial. Composed into pages, servable alone.
    Fragment,
    /// Css or javascript, linked from every page head, named by its hash.
    StyleOrScript(HeadTag),
    /// Images, audio, video and fonts.
    Media,
    /// A built-in fragment with no file behind it. Never served.
    System { source: Arc<str> },
}

impl Kind {
    /// Classifies a file by its mime type and name.
    pub(crate) fn classify(mime: &str, file_name: &str) -> Option<Kind> {
        let kind = if mime.starts_with("text/html") {
            if file_name.starts_with(FRAGMENT_MARKER) { Kind::Fragment } else { Kind::Page }
        } else if mime.starts_with("text/css") {
            Kind::StyleOrScript(HeadTag::Stylesheet)
        } else if mime.starts_with("text/javascript") {
            Kind::StyleOrScript(HeadTag::Script)
        } else if ["image", "audio", "video", "font"].iter().any(|p| mime.starts_with(p)) {
            Kind::Media
        } else {
            return None;
        };
        Some(kind)
    }

    pub fn is_html(&self) -> bool {
        matches!(self, Kind::Page | Kind::Fragment | Kind::System { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Kind::Page => "page",
            Kind::Fragment => "fragment",
            Kind::StyleOrScript(HeadTag::Stylesheet) => "style",
            Kind::StyleOrScript(HeadTag::Script) => "script",
            Kind::Media => "media",
            Kind::System { .. } => "system",
        }
    }
}

/// A single discovered file (or built-in fragment).
#[derive(Clone)]
pub struct ContentItem {
    pub(crate) kind: Kind,
    pub(crate) mime: &'static str,
    pub(crate) hash: String,
    pub(crate) template_name: String,
    pub(crate) pattern: String,
    pub(crate) path: PathBuf,
    pub(crate) scoped_path: String,
    pub(crate) landing: bool,
    pub(crate) siblings: Vec<ItemId>,

    pub(crate) coral: OnceLock<Definition>,
    pub(crate) reef: OnceLock<Arc<Reef>>,
    pub(crate) head: OnceLock<Arc<str>>,

    pub(crate) middleware: Vec<Middleware>,
    pub(crate) data: Option<DataProvider>,
    pub(crate) helpers: BTreeMap<String, Helper>,
}

impl ContentItem {
    /// Builds an item from a file's bytes.
    ///
    /// `root` is the template root, `path` the file inside it. Returns
    /// [`Error::InvalidExtension`] when the file is of no kind we serve.
    pub(crate) fn from_file(root: &Path, path: &Path, bytes: &[u8]) -> Result<Self, Error> {
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let ext = path.extension().and_then(|e| e.to_str());

        let mime = crate::mime::detect(ext, bytes)
            .ok_or_else(|| Error::InvalidExtension(path.to_owned()))?;
        let kind = Kind::classify(mime, file_name)
            .ok_or_else(|| Error::InvalidExtension(path.to_owned()))?;

        let hash = blake3::hash(bytes).to_hex().to_string();
        let dot_ext = ext.map(|e| format!(".{e}")).unwrap_or_default();
        let template_name = file_name.strip_suffix(dot_ext.as_str()).unwrap_or(file_name).to_owned();

        let scoped_path = relative(root, path);

        // The directory a root-level file sits in is the template root itself.
        let parent_name = path
            .parent()
            .and_then(Path::file_name)
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let landing = kind == Kind::Page && (template_name == parent_name || template_name == "index");

        let pattern = match &kind {
            Kind::StyleOrScript(_) => {
                let hashed = match scoped_path.rsplit_once('/') {
                    Some((dir, _)) => format!("{dir}/{hash}{dot_ext}"),
                    None => format!("{hash}{dot_ext}"),
                };
                pattern::synthesize(&hashed, &dot_ext, false)
            }
            kind => {
                let synthesized = pattern::synthesize(&scoped_path, &dot_ext, kind.is_html());
                if landing { pattern::landing(&synthesized) } else { synthesized }
            }
        };

        Ok(Self::assemble(kind, mime, hash, template_name, pattern, path.to_owned(), scoped_path, landing))
    }

    /// Builds a built-in fragment from inline template source.
    pub(crate) fn system(name: &str, source: &str) -> Self {
        let hash = blake3::hash(source.as_bytes()).to_hex().to_string();
        let pattern = pattern::synthesize(name, "", true);
        Self::assemble(
            Kind::System { source: Arc::from(source) },
            crate::response::HTML,
            hash,
            name.to_owned(),
            pattern,
            PathBuf::from(format!("system:{name}")),
            String::new(),
            false,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        kind: Kind,
        mime: &'static str,
        hash: String,
        template_name: String,
        pattern: String,
        path: PathBuf,
        scoped_path: String,
        landing: bool,
    ) -> Self {
        Self {
            kind,
            mime,
            hash,
            template_name,
            pattern,
            path,
            scoped_path,
            landing,
            siblings: Vec::new(),
            coral: OnceLock::new(),
            reef: OnceLock::new(),
            head: OnceLock::new(),
            middleware: Vec::new(),
            data: None,
            helpers: BTreeMap::new(),
        }
    }

    /// A copy with empty caches, for handing an item to another pond.
    pub(crate) fn detached(&self) -> Self {
        Self {
            siblings: Vec::new(),
            coral: OnceLock::new(),
            reef: OnceLock::new(),
            head: OnceLock::new(),
            ..self.clone()
        }
    }

    pub fn kind(&self) -> &Kind { &self.kind }
    pub fn mime(&self) -> &str { self.mime }
    pub fn hash(&self) -> &str { &self.hash }
    pub fn template_name(&self) -> &str { &self.template_name }
    pub fn pattern(&self) -> &str { &self.pattern }
    pub fn path(&self) -> &Path { &self.path }
    pub fn scoped_path(&self) -> &str { &self.scoped_path }
    pub fn is_landing(&self) -> bool { self.landing }
    pub fn siblings(&self) -> &[ItemId] { &self.siblings }
    pub fn middleware(&self) -> &[Middleware] { &self.middleware }
    pub fn has_data(&self) -> bool { self.data.is_some() }
    pub fn helper_names(&self) -> impl Iterator<Item = &str> { self.helpers.keys().map(String::as_str) }
}

impl fmt::Debug for ContentItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentItem")
            .field("kind", &self.kind.label())
            .field("pattern", &self.pattern)
            .field("scoped_path", &self.scoped_path)
            .field("landing", &self.landing)
            .field("middleware", &self.middleware.len())
            .finish_non_exhaustive()
    }
}

/// `path` relative to `root`, `/`-separated.
pub(crate) fn relative(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(root: &str, rel: &str, bytes: &[u8]) -> Result<ContentItem, Error> {
        let root = Path::new(root);
        ContentItem::from_file(root, &root.join(rel), bytes)
    }

    #[test]
    fn classifies_by_mime_and_marker() {
        assert_eq!(item("/t", "about.html", b"").unwrap().kind, Kind::Page);
        assert_eq!(item("/t", "_nav.html", b"").unwrap().kind, Kind::Fragment);
        assert_eq!(item("/t", "a.css", b"").unwrap().kind, Kind::StyleOrScript(HeadTag::Stylesheet));
        assert_eq!(item("/t", "a.js", b"").unwrap().kind, Kind::StyleOrScript(HeadTag::Script));
        assert_eq!(item("/t", "f.woff2", b"").unwrap().kind, Kind::Media);
        assert!(matches!(item("/t", "notes.txt", b"hello"), Err(Error::InvalidExtension(_))));
    }

    #[test]
    fn sniffs_when_extension_is_unknown() {
        let png = item("/t", "logo.image", b"\x89PNG\r\n\x1a\n0000").unwrap();
        assert_eq!(png.kind, Kind::Media);
        assert_eq!(png.mime, "image/png");
    }

    #[test]
    fn style_pattern_is_hashed() {
        let css = item("/t", "theme/Main.css", b"body{}").unwrap();
        let hash = blake3::hash(b"body{}").to_hex().to_string();
        assert_eq!(css.pattern, format!("/theme/{hash}.css"));
        assert_eq!(css.scoped_path, "theme/Main.css");
        assert_eq!(css.template_name, "Main");
    }

    #[test]
    fn landing_pages() {
        let blog = item("/t", "blog/blog.html", b"").unwrap();
        assert!(blog.landing);
        assert_eq!(blog.pattern, "/blog");

        let root = item("/srv/root", "root.html", b"").unwrap();
        assert!(root.landing);
        assert_eq!(root.pattern, "/");

        let index = item("/t", "index.html", b"").unwrap();
        assert_eq!(index.pattern, "/");

        let nested_index = item("/t", "docs/index.html", b"").unwrap();
        assert_eq!(nested_index.pattern, "/docs");

        let post = item("/t", "blog/post.html", b"").unwrap();
        assert!(!post.landing);
        assert_eq!(post.pattern, "/blog/post");
    }

    #[test]
    fn only_pages_land() {
        let asset = item("/t", "blog/blog.png", b"\x89PNG\r\n\x1a\n").unwrap();
        assert!(!asset.landing);
        assert_eq!(asset.pattern, "/blog/blog.png");
    }

    #[test]
    fn params_from_dotted_names() {
        let user = item("/t", "user/user.id.html", b"").unwrap();
        assert_eq!(user.pattern, "/user/{id}");
        assert_eq!(user.template_name, "user.id");
    }

    #[test]
    fn system_fragment() {
        let sys = ContentItem::system("_csrf", "<input name=csrf>");
        assert!(matches!(sys.kind, Kind::System { .. }));
        assert_eq!(sys.template_name, "_csrf");
        assert_eq!(sys.pattern, "/_csrf");
    }
}
