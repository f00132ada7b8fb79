// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Upload page end-to-end tests
//!
//! Drive the router with real HTTP requests and a scripted OCR engine:
//! - GET / shows the awaiting-upload page
//! - POST / with an image shows both images and the text table
//! - Blank images show the "no text" message
//! - Bad uploads map to the right status codes
//! - GET /health reports the engine state

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures::FutureExt;
use ocr_lens::vision::{Annotator, ModelLoader, SharedTextReader};
use ocr_lens::{build_router, AppState, ServerConfig};
use tower::ServiceExt;

use super::support::{
    body_text, hello_detection, state, upload_request, white_png, ScriptedReader,
};

/// Test 1: GET / renders the awaiting page
#[tokio::test]
async fn test_index_shows_upload_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(state(ScriptedReader::returning(vec![]), dir.path()));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("<h1>Text Detection</h1>"));
    assert!(html.contains("Please upload an image to get started."));
    assert!(html.contains(
        "This app can detect text in various images like signs, documents, and screenshots."
    ));
    assert!(html.contains(r#"accept=".jpg,.jpeg,.png""#));
}

/// Test 2: HELLO image produces both panes and a one-row table
#[tokio::test]
async fn test_hello_upload_shows_results() {
    let dir = tempfile::tempdir().unwrap();
    let reader = ScriptedReader::returning(vec![hello_detection()]);
    let app = build_router(state(reader.clone(), dir.path()));

    let response = app
        .oneshot(upload_request("hello.png", &white_png(200, 100)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("<h2>Original Image</h2>"));
    assert!(html.contains("<h2>Detected Text</h2>"));
    assert!(html.contains("<h2>Extracted Text</h2>"));
    assert!(html.contains("<th>No.</th><th>Text</th><th>Confidence</th>"));
    assert!(html.contains("<tr><td>1</td><td>HELLO</td><td>0.95</td></tr>"));
    assert_eq!(html.matches("data:image/png;base64,").count(), 2);
    assert!(!html.contains("Please upload an image to get started."));
    assert_eq!(reader.seen().len(), 1);
}

/// Test 3: Blank image shows the message instead of a table
#[tokio::test]
async fn test_blank_upload_shows_no_text_message() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(state(ScriptedReader::returning(vec![]), dir.path()));

    let response = app
        .oneshot(upload_request("blank.png", &white_png(64, 64)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("No text detected in the image."));
    assert!(!html.contains("<table>"));
}

/// Test 4: Submitting the form without choosing a file
#[tokio::test]
async fn test_empty_file_field_shows_awaiting_page() {
    let dir = tempfile::tempdir().unwrap();
    let reader = ScriptedReader::returning(vec![hello_detection()]);
    let app = build_router(state(reader.clone(), dir.path()));

    let response = app.oneshot(upload_request("", b"")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Please upload an image to get started."));
    assert!(reader.seen().is_empty());
}

/// Test 5: Unsupported extension never reaches the engine
#[tokio::test]
async fn test_unsupported_extension_is_415() {
    let dir = tempfile::tempdir().unwrap();
    let reader = ScriptedReader::returning(vec![hello_detection()]);
    let app = build_router(state(reader.clone(), dir.path()));

    let response = app
        .oneshot(upload_request("animation.gif", &white_png(8, 8)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let html = body_text(response).await;
    assert!(html.contains("unsupported_file"));
    assert!(reader.seen().is_empty());
}

/// Test 6: Correct extension but bytes that are not an image
#[tokio::test]
async fn test_garbage_bytes_are_415() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(state(ScriptedReader::returning(vec![]), dir.path()));

    let response = app
        .oneshot(upload_request("notes.jpg", b"plain text, not a jpeg"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

/// Test 7: Truncated PNG is a decode failure
#[tokio::test]
async fn test_truncated_png_is_422() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(state(ScriptedReader::returning(vec![]), dir.path()));
    let truncated = white_png(32, 32)[..40].to_vec();

    let response = app
        .oneshot(upload_request("cut.png", &truncated))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await.contains("decode_failure"));
}

/// Test 8: Engine errors are 500 with an error page
#[tokio::test]
async fn test_engine_failure_is_500() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(state(ScriptedReader::failing(), dir.path()));

    let response = app
        .oneshot(upload_request("sign.png", &white_png(16, 16)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let html = body_text(response).await;
    assert!(html.contains("ocr_failure"));
    assert!(html.contains(r#"name="file""#));
}

/// Test 9: Engine that cannot be built is 503, and the next upload retries
#[tokio::test]
async fn test_unavailable_engine_is_503() {
    let dir = tempfile::tempdir().unwrap();
    let loader = ModelLoader::from_factory("missing", || {
        async { Err::<SharedTextReader, _>(anyhow::anyhow!("det_model.onnx not found")) }.boxed()
    });
    let state = AppState::new(
        loader,
        Annotator::without_font(),
        ServerConfig {
            temp_dir: Some(dir.path().to_path_buf()),
            ..ServerConfig::default()
        },
    );
    let app = build_router(state.clone());

    let response = app
        .clone()
        .oneshot(upload_request("sign.png", &white_png(16, 16)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(body_text(response).await.contains("model_unavailable"));

    let response = app
        .oneshot(upload_request("sign.png", &white_png(16, 16)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(!state.loader.is_loaded());
}

/// Test 10: Uploads above the configured cap are rejected
#[tokio::test]
async fn test_oversized_upload_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let reader = ScriptedReader::returning(vec![]);
    let state = AppState::new(
        ModelLoader::with_reader("scripted", reader.clone()),
        Annotator::without_font(),
        ServerConfig {
            max_upload_bytes: 16,
            temp_dir: Some(dir.path().to_path_buf()),
            ..ServerConfig::default()
        },
    );
    let app = build_router(state);

    let response = app
        .oneshot(upload_request("big.png", &white_png(64, 64)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(reader.seen().is_empty());
}

/// Test 11: Health endpoint
#[tokio::test]
async fn test_health_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(state(ScriptedReader::returning(vec![]), dir.path()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["model_loaded"], true);
}

/// Test 12: Body far beyond the cap is cut off by the body limit and still 413
#[tokio::test]
async fn test_body_over_request_limit_is_413() {
    let dir = tempfile::tempdir().unwrap();
    let reader = ScriptedReader::returning(vec![]);
    let state = AppState::new(
        ModelLoader::with_reader("scripted", reader.clone()),
        Annotator::without_font(),
        ServerConfig {
            max_upload_bytes: 16,
            temp_dir: Some(dir.path().to_path_buf()),
            ..ServerConfig::default()
        },
    );
    let app = build_router(state);

    // PNG magic followed by 200 KiB, well past cap plus form overhead
    let mut bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.resize(200 * 1024, 0);

    let response = app
        .oneshot(upload_request("huge.png", &bytes))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body_text(response).await.contains("file_too_large"));
    assert!(reader.seen().is_empty());
    assert!(super::support::dir_is_empty(dir.path()));
}
