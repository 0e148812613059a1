//! Route pattern synthesis.
//!
//! A file's path relative to the template root becomes its route:
//!
//! | File | Pattern |
//! |---|---|
//! | `about.html` | `/about` |
//! | `blog/blog.html` (landing) | `/blog` |
//! | `user/user.id.html` | `/user/{id}` |
//! | `user/user.id.edit.html` | `/user/{id}/edit` |
//! | `img/Big Cat.png` | `/img/big-cat.png` |
//!
//! Dotted names are how a page asks for path parameters: every odd part
//! becomes a `{param}` segment, which is exactly the syntax the router's
//! radix tree understands.

/// Synthesizes the route pattern for a file.
///
/// `relative` is the path relative to the template root, `ext` the file
/// extension including its dot. Assets keep their full name; html pages and
/// fragments lose the extension and have dotted names expanded into
/// parameters. Landing collapse is separate, see [`landing`].
pub fn synthesize(relative: &str, ext: &str, is_html: bool) -> String {
    let normalized = relative.replace('\\', "/").to_lowercase().replace(' ', "-");

    if !is_html {
        return tidy(format!("/{normalized}"));
    }

    let ext = ext.to_lowercase();
    let stem = normalized.strip_suffix(ext.as_str()).unwrap_or(&normalized);

    let mut segments: Vec<String> = Vec::new();
    for part in stem.split('/').filter(|p| !p.is_empty()) {
        let dotted = !part.starts_with('.') && part.trim_end_matches('.').contains('.');
        if !dotted {
            segments.push(part.to_owned());
            continue;
        }
        for (k, piece) in part.split('.').enumerate() {
            if piece.is_empty() {
                continue;
            }
            // `user/user.id` names its directory again; drop the repeat.
            if k == 0 && segments.last().is_some_and(|last| last == piece) {
                continue;
            }
            if k % 2 == 0 {
                segments.push(piece.to_owned());
            } else {
                segments.push(format!("{{{piece}}}"));
            }
        }
    }

    tidy(format!("/{}", segments.join("/")))
}

/// Collapses a landing page's pattern onto its directory's pattern.
///
/// `/blog/blog` becomes `/blog`; a landing page at the root becomes `/`.
pub fn landing(pattern: &str) -> String {
    match pattern.trim_end_matches('/').rsplit_once('/') {
        Some((parent, _)) => tidy(parent.to_owned()),
        None => "/".to_owned(),
    }
}

/// Collapses `//` and strips a trailing slash, except on the bare root.
fn tidy(mut pattern: String) -> String {
    while pattern.contains("//") {
        pattern = pattern.replace("//", "/");
    }
    if pattern.len() > 1 && pattern.ends_with('/') {
        pattern.pop();
    }
    if pattern.is_empty() {
        pattern.push('/');
    }
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_pages() {
        assert_eq!(synthesize("about.html", ".html", true), "/about");
        assert_eq!(synthesize("docs/Getting Started.html", ".html", true), "/docs/getting-started");
        assert_eq!(synthesize("docs\\faq.html", ".html", true), "/docs/faq");
    }

    #[test]
    fn is_deterministic() {
        let a = synthesize("a/b.c.d.html", ".html", true);
        let b = synthesize("a/b.c.d.html", ".html", true);
        assert_eq!(a, b);
        assert_eq!(a, "/a/b/{c}/d");
    }

    #[test]
    fn dotted_names_become_params() {
        assert_eq!(synthesize("user/user.id.html", ".html", true), "/user/{id}");
        assert_eq!(synthesize("user/user.id.edit.html", ".html", true), "/user/{id}/edit");
        assert_eq!(synthesize("shop/item.sku.html", ".html", true), "/shop/item/{sku}");
    }

    #[test]
    fn leading_dot_is_not_a_param() {
        assert_eq!(synthesize(".well-known/x.html", ".html", true), "/.well-known/x");
    }

    #[test]
    fn fragments_keep_their_underscore() {
        assert_eq!(synthesize("_footer.html", ".html", true), "/_footer");
    }

    #[test]
    fn assets_keep_extension() {
        assert_eq!(synthesize("img/Big Cat.PNG", ".PNG", false), "/img/big-cat.png");
        assert_eq!(synthesize("/abc123.css", ".css", false), "/abc123.css");
    }

    #[test]
    fn landing_collapses_to_directory() {
        assert_eq!(landing(&synthesize("blog/blog.html", ".html", true)), "/blog");
        assert_eq!(landing(&synthesize("root.html", ".html", true)), "/");
        assert_eq!(landing(&synthesize("a/b/b.html", ".html", true)), "/a/b");
        assert_eq!(landing("/"), "/");
    }
}
