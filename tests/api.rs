//! HTTP-level tests: the axum router driven in-process with `oneshot`.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use log2txt::{router, FsStore, LogService, MemoryStore, PipelineConfig};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "log2txt-test-boundary";
const LIMIT: usize = 1024 * 1024;

// ── Test helpers ─────────────────────────────────────────────────────────────

async fn app() -> (TempDir, Router) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let store = FsStore::open(dir.path().join("converted"))
        .await
        .expect("open scratch dir");
    let service = LogService::new(Arc::new(store), PipelineConfig::default());
    (dir, router(Arc::new(service), LIMIT))
}

/// Build a multipart body with one file part per `(field, filename, content)`.
fn multipart(parts: &[(&str, &str, &str)]) -> Body {
    let mut body = String::new();
    for (field, filename, content) in parts {
        body.push_str(&format!("--{BOUNDARY}\r\n"));
        body.push_str(&format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
        ));
        body.push_str("Content-Type: application/octet-stream\r\n\r\n");
        body.push_str(content);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    Body::from(body)
}

fn upload_request(uri: &str, parts: &[(&str, &str, &str)]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(multipart(parts))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, json: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = resp.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, headers, body)
}

async fn send_json(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, _, body) = send(app, req).await;
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

// ── Health ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_and_ready() {
    let (_dir, app) = app().await;
    let (status, _) = send_json(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send_json(&app, get("/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

// ── Convert ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn convert_then_download() {
    let (_dir, app) = app().await;
    let (status, body) = send_json(
        &app,
        upload_request(
            "/api/convert",
            &[("file", "app.log", "one\r\ntwo\r\n"), ("file", "db.log", "x")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["convertedFiles"], serde_json::json!(["app.txt", "db.txt"]));

    let (status, headers, bytes) = send(&app, get("/api/download?filename=app.txt")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"one\ntwo\n");
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"app.txt\""
    );
}

#[tokio::test]
async fn convert_without_files_is_bad_request() {
    let (_dir, app) = app().await;
    let (status, body) = send_json(
        &app,
        upload_request("/api/convert", &[("other", "a.log", "x")]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn convert_rejects_non_multipart() {
    let (_dir, app) = app().await;
    let (status, body) = send_json(&app, post_json("/api/convert", serde_json::json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("invalid upload"));
}

// ── Merge ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn merge_logs_returns_content() {
    let (_dir, app) = app().await;
    let (status, body) = send_json(
        &app,
        upload_request(
            "/api/merge-logs",
            &[("files", "a.log", "x"), ("files", "b.log", "y")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mergedFileName"], "merged.log");
    assert_eq!(body["mergedContent"], "x\ny\n");
}

#[tokio::test]
async fn merge_logs_with_one_file_is_bad_request() {
    let (_dir, app) = app().await;
    let (status, body) = send_json(
        &app,
        upload_request("/api/merge-logs", &[("files", "a.log", "x")]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("insufficient files"));
}

#[tokio::test]
async fn merge_txt_flow() {
    let (_dir, app) = app().await;
    send(
        &app,
        upload_request(
            "/api/convert",
            &[("file", "a.log", "A\r\n"), ("file", "b.log", "B\r\n")],
        ),
    )
    .await;

    let (status, body) = send_json(
        &app,
        post_json("/api/merge-txt", serde_json::json!({ "files": ["a.txt", "b.txt"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mergedFileName"], "merged.txt");

    let (status, _, bytes) = send(&app, get("/api/download?filename=merged.txt")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"A\n\nB\n\n");
}

#[tokio::test]
async fn merge_txt_errors() {
    let (_dir, app) = app().await;
    let (status, _) = send_json(
        &app,
        post_json("/api/merge-txt", serde_json::json!({ "files": ["a.txt"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        &app,
        post_json("/api/merge-txt", serde_json::json!({ "files": ["a.txt", "b.txt"] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let req = Request::builder()
        .method("POST")
        .uri("/api/merge-txt")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = send_json(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Download ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn download_requires_filename() {
    let (_dir, app) = app().await;
    for uri in ["/api/download", "/api/download?filename="] {
        let (status, body) = send_json(&app, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"], "Filename is required.");
    }
}

#[tokio::test]
async fn download_traversal_is_not_found() {
    let (dir, app) = app().await;
    std::fs::write(dir.path().join("secret.txt"), "secret").unwrap();
    for uri in [
        "/api/download?filename=..%2Fsecret.txt",
        "/api/download?filename=..%2F..%2Fetc%2Fpasswd",
        "/api/download?filename=..",
        "/api/download?filename=a.txt&folder=..",
    ] {
        let (status, body) = send_json(&app, get(uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn download_all_returns_zip() {
    let (_dir, app) = app().await;
    send(
        &app,
        upload_request(
            "/api/convert",
            &[("file", "a.log", "a\r\n"), ("file", "b.log", "b\r\n")],
        ),
    )
    .await;

    let (status, headers, bytes) = send(&app, get("/api/download-all")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/zip");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"converted_files.zip\""
    );

    let archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    let mut names: Vec<&str> = archive.file_names().collect();
    names.sort();
    assert_eq!(names, ["a.txt", "b.txt"]);
}

// ── Reset ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn clear_cache_then_download_is_not_found() {
    let (_dir, app) = app().await;
    send(
        &app,
        upload_request("/api/convert", &[("file", "a.log", "a")]),
    )
    .await;

    let (status, body) = send_json(&app, post_json("/api/clear-cache", Value::Null)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Cache cleared successfully");

    let (status, _) = send_json(&app, get("/api/download?filename=a.txt")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn works_over_memory_store() {
    let service = LogService::new(Arc::new(MemoryStore::new()), PipelineConfig::default());
    let app = router(Arc::new(service), LIMIT);
    let (status, body) = send_json(
        &app,
        upload_request("/api/convert", &[("file", "m.log", "m\r\n")]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["convertedFiles"][0], "m.txt");
}

#[tokio::test]
async fn upload_over_limit_is_rejected() {
    let store = MemoryStore::new();
    let service = LogService::new(Arc::new(store), PipelineConfig::default());
    let app = router(Arc::new(service), 64);
    let big = "x".repeat(4096);
    let (status, _, _) = send(
        &app,
        upload_request("/api/convert", &[("file", "big.log", &big)]),
    )
    .await;
    assert!(status.is_client_error(), "got {status}");
}
