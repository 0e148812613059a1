//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::request::Parts;
use http::{HeaderMap, Method, Uri};

/// An incoming HTTP request, with its body already collected.
///
/// This is what handlers, middleware and data providers see.
pub struct Request {
    pub(crate) method: Method,
    pub(crate) uri: Uri,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
}

impl Request {
    pub(crate) fn new(parts: Parts, body: Bytes, params: HashMap<String, String>) -> Self {
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            params,
        }
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn path(&self) -> &str { self.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Header lookup. Names are case-insensitive; non-ASCII values read as `None`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// A page at `user/user.id.html` is routed as `/user/{id}`; on
    /// `/user/42`, `req.param("id")` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Returns the first value of a query-string parameter, percent-decoded.
    ///
    /// `?v=abc` gives `Some("abc")`; a bare `?v` gives `Some("")`.
    pub fn query(&self, key: &str) -> Option<String> {
        let query = self.uri.query()?;
        query.split('&').find_map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            if decode(k) != key {
                return None;
            }
            Some(decode(v))
        })
    }
}

fn decode(raw: &str) -> String {
    let raw = raw.replace('+', " ");
    match urlencoding::decode(&raw) {
        Ok(s) => s.into_owned(),
        Err(_) => raw,
    }
}

#[cfg(test)]
pub(crate) fn for_test(uri: &str) -> Request {
    let (parts, ()) = http::Request::builder()
        .uri(uri)
        .body(())
        .map(http::Request::into_parts)
        .unwrap();
    Request::new(parts, Bytes::new(), HashMap::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_lookup() {
        let req = for_test("/a.css?x=1&v=abc%20d&flag");
        assert_eq!(req.query("v").as_deref(), Some("abc d"));
        assert_eq!(req.query("flag").as_deref(), Some(""));
        assert_eq!(req.query("missing"), None);
        assert_eq!(req.path(), "/a.css");
    }

    #[test]
    fn no_query_string() {
        assert_eq!(for_test("/plain").query("v"), None);
    }
}
