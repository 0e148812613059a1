//! A small site end to end: discovery, composition, head links and cache
//! busting, through the router exactly as the server drives it.

use std::fs;

use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use shoal::{Pond, PondOptions, Router};

fn site() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("index.html"), r#"<h1>home</h1>{% include "_footer" %}"#).unwrap();
    fs::write(root.join("about.html"), r#"<h1>about</h1>{% include "_footer" %}"#).unwrap();
    fs::write(root.join("_footer.html"), "<footer>fin</footer>").unwrap();
    fs::write(root.join("style.css"), "body { margin: 0 }").unwrap();
    dir
}

async fn send(router: &Router, method: Method, uri: &str) -> (StatusCode, String) {
    let req = http::Request::builder()
        .method(method)
        .uri(uri)
        .body(Full::new(Bytes::new()))
        .unwrap();
    let res = router.call(req).await;
    let status = res.status();
    let body = res.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8_lossy(&body).into_owned())
}

fn link_tag(page: &str) -> &str {
    let start = page.find("<link").unwrap();
    let end = start + page[start..].find('>').unwrap() + 1;
    &page[start..end]
}

#[tokio::test]
async fn small_site() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let dir = site();
    let pond = Pond::new(dir.path(), PondOptions::default()).unwrap();

    let css = pond.find("style.css").unwrap();
    let hash = pond.item(css).hash().to_owned();
    let css_route = format!("/{hash}.css");

    let patterns: Vec<_> = pond.routes().into_iter().map(|r| r.pattern).collect();
    assert!(patterns.contains(&"/".to_owned()));
    assert!(patterns.contains(&"/about".to_owned()));
    assert!(patterns.contains(&css_route));

    let router = Router::new().pond(pond).unwrap();

    let (status, home) = send(&router, Method::GET, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(home.contains("<h1>home</h1><footer>fin</footer>"));

    let (status, about) = send(&router, Method::GET, "/about").await;
    assert_eq!(status, StatusCode::OK);
    assert!(about.contains("<footer>fin</footer>"));

    let link = link_tag(&home);
    assert_eq!(link, link_tag(&about));
    assert_eq!(link, format!(r#"<link rel="stylesheet" href="{css_route}?v={hash}">"#));

    let (status, _) = send(&router, Method::GET, &format!("{css_route}?v=0000")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&router, Method::GET, &css_route).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&router, Method::GET, &format!("{css_route}?v={hash}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "body { margin: 0 }");

    let (status, footer) = send(&router, Method::GET, "/_footer").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(footer, "<footer>fin</footer>");
}

#[tokio::test]
async fn pond_routes_answer_any_method() {
    let dir = site();
    let pond = Pond::new(dir.path(), PondOptions::default()).unwrap();
    let router = Router::new().pond(pond).unwrap();

    assert_eq!(send(&router, Method::POST, "/about").await.0, StatusCode::OK);
    assert_eq!(send(&router, Method::GET, "/missing").await.0, StatusCode::NOT_FOUND);
}
