//! Router tests against a temporary served root.

use std::path::Path;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use dirshare::handlers::FAVICON;
use dirshare::{ListingPayload, ServeState, routes};
use tower::ServiceExt;

mod common;
use common::{RecordingShell, nested_dir, scenario_dir};

fn test_app(root: &Path, shell: Arc<RecordingShell>) -> Router {
    let state = ServeState {
        shell,
        ..ServeState::new(root.canonicalize().unwrap(), 8080)
    };
    routes::router(state)
}

async fn get(app: Router, uri: &str, json: bool) -> (StatusCode, Vec<u8>) {
    let mut request = Request::builder().uri(uri).method(Method::GET);
    if json {
        request = request.header(header::ACCEPT, "application/json");
    }
    let response = app
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn get_listing(app: Router, uri: &str) -> ListingPayload {
    let (status, body) = get(app, uri, true).await;
    assert_eq!(status, StatusCode::OK, "GET {uri}");
    serde_json::from_slice(&body).unwrap()
}

fn pairs(listing: &ListingPayload) -> Vec<(&str, &str)> {
    listing
        .subdirectories
        .iter()
        .map(|entry| (entry.name.as_str(), entry.path.as_str()))
        .collect()
}

#[tokio::test]
async fn test_index_lists_root_children() {
    let dir = scenario_dir();
    let app = test_app(dir.path(), RecordingShell::new());

    let listing = get_listing(app, "/").await;

    assert_eq!(pairs(&listing), [("a.txt", "a.txt"), ("b", "b")]);
    assert_eq!(listing.port, 8080);
    assert_eq!(
        listing.directory,
        dir.path().canonicalize().unwrap().display().to_string()
    );
}

#[tokio::test]
async fn test_empty_subdirectory_lists_nothing() {
    let dir = scenario_dir();
    let app = test_app(dir.path(), RecordingShell::new());

    let listing = get_listing(app, "/b").await;

    assert!(listing.subdirectories.is_empty());
    assert!(listing.directory.ends_with('b'));
}

#[tokio::test]
async fn test_file_returns_raw_bytes() {
    let dir = scenario_dir();
    let app = test_app(dir.path(), RecordingShell::new());

    let response = app
        .oneshot(Request::get("/a.txt").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE].to_str().unwrap(),
        "text/plain"
    );
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "12");
    let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    assert_eq!(&body[..], b"hello from a");
}

#[tokio::test]
async fn test_nested_links_accumulate_path() {
    let dir = nested_dir();
    let shell = RecordingShell::new();

    let docs = get_listing(test_app(dir.path(), shell.clone()), "/docs").await;
    assert_eq!(
        pairs(&docs),
        [("guide", "docs/guide"), ("readme.txt", "docs/readme.txt")]
    );

    let guide = get_listing(test_app(dir.path(), shell.clone()), "/docs/guide/").await;
    assert_eq!(pairs(&guide), [("intro.md", "docs/guide/intro.md")]);

    let (status, body) = get(test_app(dir.path(), shell), "/docs/guide/intro.md", false).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"# Intro");
}

#[tokio::test]
async fn test_html_listing_links_to_entries() {
    let dir = nested_dir();
    let app = test_app(dir.path(), RecordingShell::new());

    let (status, body) = get(app, "/docs", false).await;
    let html = String::from_utf8(body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<a href=\"/docs/guide\">guide</a>"));
    assert!(html.contains("<a href=\"/docs/readme.txt\">readme.txt</a>"));
}

#[tokio::test]
async fn test_traversal_is_forbidden() {
    let outer = tempfile::TempDir::new().unwrap();
    common::write(outer.path(), "secret.txt", "top secret");
    common::write(outer.path(), "served/public.txt", "public");
    let shell = RecordingShell::new();

    for uri in [
        "/../secret.txt",
        "/../../etc/passwd",
        "/%2e%2e/secret.txt",
        "/public.txt/../../secret.txt",
        "/..%2fsecret.txt",
    ] {
        let app = test_app(&outer.path().join("served"), shell.clone());
        let (status, body) = get(app, uri, false).await;

        assert_eq!(status, StatusCode::FORBIDDEN, "GET {uri}");
        assert!(!String::from_utf8_lossy(&body).contains("top secret"));
    }
    assert_eq!(shell.errors().len(), 5);
}

#[tokio::test]
async fn test_parent_segments_inside_root_are_allowed() {
    let dir = nested_dir();
    let app = test_app(dir.path(), RecordingShell::new());

    let (status, body) = get(app, "/docs/guide/../readme.txt", false).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"readme");
}

#[tokio::test]
async fn test_missing_path_is_server_error_with_diagnostic() {
    let dir = scenario_dir();
    let shell = RecordingShell::new();
    let app = test_app(dir.path(), shell.clone());

    let (status, body) = get(app, "/missing.txt", false).await;
    let text = String::from_utf8(body).unwrap();

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(text.contains("missing.txt"), "body: {text}");

    let errors = shell.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("missing.txt"));
}

#[tokio::test]
async fn test_favicon_served_at_any_depth() {
    let dir = scenario_dir();
    // A real file with the same name is shadowed by the bundled icon.
    common::write(dir.path(), "b/favicon.ico", "not an icon");

    for uri in ["/favicon.ico", "/b/favicon.ico", "/no/such/dir/favicon.ico"] {
        let app = test_app(dir.path(), RecordingShell::new());
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/x-icon");
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        assert_eq!(&body[..], FAVICON);
    }
}

#[tokio::test]
async fn test_file_root_serves_file_on_index() {
    let dir = scenario_dir();
    let app = test_app(&dir.path().join("a.txt"), RecordingShell::new());

    let (status, body) = get(app, "/", false).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"hello from a");
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlink_out_of_root_is_forbidden() {
    let outside = tempfile::TempDir::new().unwrap();
    common::write(outside.path(), "secret.txt", "top secret");
    let dir = scenario_dir();
    std::os::unix::fs::symlink(outside.path(), dir.path().join("escape")).unwrap();
    let app = test_app(dir.path(), RecordingShell::new());

    let (status, _) = get(app, "/escape/secret.txt", false).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}
