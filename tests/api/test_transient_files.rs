// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Transient upload file lifecycle
//!
//! The engine must read from a real file that exists while it runs, and
//! that file must be gone once the request completes, whatever the outcome.

use ocr_lens::{build_router, handle_upload, Page, UploadedImage};
use tower::ServiceExt;

use super::support::{
    dir_is_empty, hello_detection, state, upload_request, white_png, ScriptedReader,
};

/// Test 1: File exists during OCR and is removed after success
#[tokio::test]
async fn test_file_removed_after_success() {
    let dir = tempfile::tempdir().unwrap();
    let reader = ScriptedReader::returning(vec![hello_detection()]);
    let state = state(reader.clone(), dir.path());

    let page = handle_upload(&state, Some(UploadedImage::new("sign.png", white_png(32, 32))))
        .await
        .unwrap();
    assert!(matches!(page, Page::Results(_)));

    let seen = reader.seen();
    assert_eq!(seen.len(), 1);
    let (path, existed) = &seen[0];
    assert!(existed);
    assert!(path.starts_with(dir.path()));
    assert_eq!(path.extension().unwrap(), "png");
    assert!(!path.exists());
    assert!(dir_is_empty(dir.path()));
}

/// Test 2: File removed when the engine fails
#[tokio::test]
async fn test_file_removed_after_engine_failure() {
    let dir = tempfile::tempdir().unwrap();
    let reader = ScriptedReader::failing();
    let state = state(reader.clone(), dir.path());

    let result =
        handle_upload(&state, Some(UploadedImage::new("sign.jpeg", white_png(32, 32)))).await;
    assert!(result.is_err());

    let seen = reader.seen();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].1);
    assert!(dir_is_empty(dir.path()));
}

/// Test 3: Transient name follows the detected format, not the upload name
#[tokio::test]
async fn test_file_named_by_content_format() {
    let dir = tempfile::tempdir().unwrap();
    let reader = ScriptedReader::returning(vec![]);
    let state = state(reader.clone(), dir.path());

    // PNG bytes uploaded under a .jpg name
    handle_upload(&state, Some(UploadedImage::new("photo.jpg", white_png(8, 8))))
        .await
        .unwrap();

    let (path, _) = &reader.seen()[0];
    assert_eq!(path.extension().unwrap(), "png");
    assert_ne!(path.file_name().unwrap(), "photo.jpg");
}

/// Test 4: Concurrent uploads get distinct files and all are cleaned up
#[tokio::test]
async fn test_concurrent_uploads_use_distinct_files() {
    let dir = tempfile::tempdir().unwrap();
    let reader = ScriptedReader::returning(vec![hello_detection()]);
    let app = build_router(state(reader.clone(), dir.path()));

    let requests = (0..6).map(|i| {
        let app = app.clone();
        async move {
            app.oneshot(upload_request(&format!("sign-{i}.png"), &white_png(40, 40)))
                .await
                .unwrap()
        }
    });
    let responses = futures::future::join_all(requests).await;
    assert!(responses.iter().all(|r| r.status().is_success()));

    let mut paths: Vec<_> = reader.seen().into_iter().map(|(p, _)| p).collect();
    assert_eq!(paths.len(), 6);
    paths.sort();
    paths.dedup();
    assert_eq!(paths.len(), 6);
    assert!(dir_is_empty(dir.path()));
}
