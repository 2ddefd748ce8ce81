//! End-to-end tests for the HTTP API, driven through the router with
//! `tower::ServiceExt::oneshot` (no socket).

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use folio_server::{router, AppState, ServerConfig};
use folio_store::SqliteBlockStore;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "folio-test-boundary";

struct TestServer {
    app: Router,
    uploads: TempDir,
}

fn server(seed: bool) -> TestServer {
    let store = SqliteBlockStore::in_memory().unwrap();
    if seed {
        store.seed_if_empty().unwrap();
    }
    let uploads = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        uploads_dir: uploads.path().to_path_buf(),
        max_upload_bytes: 1024,
        ..Default::default()
    };
    let app = router(Arc::new(AppState::new(store, &config)));
    TestServer { app, uploads }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let (status, bytes) = send(app, request).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn multipart_request(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let server = server(false);
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&server.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn test_list_seeded_document() {
    let server = server(true);
    let (status, body) = send_json(&server.app, "GET", "/api/blocks", None).await;
    assert_eq!(status, StatusCode::OK);

    let blocks = body.as_array().unwrap();
    assert_eq!(blocks.len(), 5);
    let positions: Vec<i64> = blocks.iter().map(|b| b["position"].as_i64().unwrap()).collect();
    assert_eq!(positions, vec![0, 1, 2, 3, 4]);
    assert_eq!(blocks[0]["type"], "text");
    assert_eq!(blocks[0]["style"], "h1");
    assert_eq!(blocks[2]["type"], "image");
    assert_eq!(blocks[2]["imageUrl"], "https://picsum.photos/800/400");
    assert!(blocks[0]["createdAt"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_list_empty() {
    let server = server(false);
    let (status, body) = send_json(&server.app, "GET", "/api/blocks", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_create_text_block() {
    let server = server(false);
    let (status, body) = send_json(
        &server.app,
        "POST",
        "/api/blocks",
        Some(json!({"type": "text", "content": "hello", "style": "h2", "position": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["content"], "hello");
    assert_eq!(body["style"], "h2");
    assert_eq!(body["createdAt"], body["updatedAt"]);
    let id = body["id"].as_i64().unwrap();

    let (_, list) = send_json(&server.app, "GET", "/api/blocks", None).await;
    assert_eq!(list[0]["id"].as_i64(), Some(id));
}

#[tokio::test]
async fn test_create_rejects_bad_drafts() {
    let server = server(false);
    let cases = [
        json!({"content": "no type", "position": 0}),
        json!({"type": "video", "position": 0}),
        json!({"type": "text", "content": "no position"}),
        json!({"type": "image", "position": 0}),
        json!({"type": "image", "imageUrl": "/x.png", "width": 0, "position": 0}),
    ];
    for draft in cases {
        let (status, body) = send_json(&server.app, "POST", "/api/blocks", Some(draft.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{draft}");
        assert_eq!(body["code"], "validation", "{draft}");
        assert!(body["error"].is_string());
    }

    let (_, list) = send_json(&server.app, "GET", "/api/blocks", None).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_create_rejects_malformed_json() {
    let server = server(false);
    let request = Request::builder()
        .method("POST")
        .uri("/api/blocks")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, bytes) = send(&server.app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "validation");
}

#[tokio::test]
async fn test_update_block() {
    let server = server(true);
    let (_, list) = send_json(&server.app, "GET", "/api/blocks", None).await;
    let first = &list[0];
    let id = first["id"].as_i64().unwrap();

    let (status, body) = send_json(
        &server.app,
        "PUT",
        &format!("/api/blocks/{id}"),
        Some(json!({"content": "Renamed", "position": 9})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "Renamed");
    assert_eq!(body["position"], 9);
    assert_eq!(body["style"], "h1");
    assert_eq!(body["createdAt"], first["createdAt"]);
    assert!(body["updatedAt"].as_u64() >= first["updatedAt"].as_u64());

    let (_, list) = send_json(&server.app, "GET", "/api/blocks", None).await;
    assert_eq!(list[4]["id"].as_i64(), Some(id));
}

#[tokio::test]
async fn test_update_null_clears_field() {
    let server = server(true);
    // Block 3 is the sample 800x400 image.
    let (status, body) = send_json(
        &server.app,
        "PUT",
        "/api/blocks/3",
        Some(json!({"width": null})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["width"], Value::Null);
    assert_eq!(body["height"], 400);

    let (_, list) = send_json(&server.app, "GET", "/api/blocks", None).await;
    assert_eq!(list[2]["width"], Value::Null);
}

#[tokio::test]
async fn test_update_errors() {
    let server = server(true);

    let (status, body) =
        send_json(&server.app, "PUT", "/api/blocks/1", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "no_op");

    let (status, body) = send_json(
        &server.app,
        "PUT",
        "/api/blocks/999",
        Some(json!({"position": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let (status, body) = send_json(
        &server.app,
        "PUT",
        "/api/blocks/abc",
        Some(json!({"position": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");

    // Text block 1 has no image fields.
    let (status, body) = send_json(
        &server.app,
        "PUT",
        "/api/blocks/1",
        Some(json!({"imageUrl": "/x.png"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");
}

#[tokio::test]
async fn test_upload_and_serve() {
    let server = server(false);
    let data = b"\x89PNG\r\n\x1a\nfake";
    let (status, bytes) = send(
        &server.app,
        multipart_request("image", "Cat.PNG", "image/png", data),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let url = body["imageUrl"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/"));
    assert!(url.ends_with(".png"));
    assert!(!url.contains("Cat"));

    let stored = std::fs::read_dir(server.uploads.path()).unwrap().count();
    assert_eq!(stored, 1);

    let request = Request::builder().uri(&url).body(Body::empty()).unwrap();
    let response = server.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let served = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&served[..], data);
}

#[tokio::test]
async fn test_upload_rejects_non_images() {
    let server = server(false);
    let cases = [
        ("notes.txt", "text/plain"),
        ("cat.png", "text/plain"),
        ("cat.svg", "image/svg+xml"),
    ];
    for (name, mime) in cases {
        let (status, bytes) =
            send(&server.app, multipart_request("image", name, mime, b"data")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{name}");
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "validation");
    }
    assert_eq!(std::fs::read_dir(server.uploads.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_upload_requires_image_field() {
    let server = server(false);
    let (status, bytes) = send(
        &server.app,
        multipart_request("file", "cat.png", "image/png", b"data"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test]
async fn test_upload_too_large() {
    let server = server(false);
    let data = vec![0u8; 2048];
    let (status, bytes) = send(
        &server.app,
        multipart_request("image", "big.png", "image/png", &data),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "too_large");
}

#[tokio::test]
async fn test_serve_rejects_unknown_and_unsafe_names() {
    let server = server(false);
    std::fs::write(server.uploads.path().join("notes.txt"), b"secret").unwrap();

    for uri in [
        "/uploads/missing.png",
        "/uploads/notes.txt",
        "/uploads/..%2Fetc%2Fpasswd",
        "/uploads/.hidden.png",
    ] {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, _) = send(&server.app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    }
}
