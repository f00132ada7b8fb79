// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload page handlers

use axum::{extract::State, http::StatusCode, response::Html, Json};
use axum_extra::extract::multipart::MultipartError;
use axum_extra::extract::Multipart;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::errors::PageError;
use super::http_server::AppState;
use super::page::{
    render_html, ExtractedText, ImagePane, Page, ResultsView, ANNOTATED_LABEL, ORIGINAL_LABEL,
};
use super::upload::{TransientFile, UploadedImage};
use crate::vision::image_utils::{encode_png, mime_type, to_data_uri};
use crate::vision::{check_extension, detect_format};

/// Multipart field carrying the image
pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model_loaded: bool,
}

/// Turn the current upload (if any) into the page to show
///
/// The upload is written to a transient file that exists only while the
/// OCR engine reads it; it is removed on every exit path.
///
/// # Errors
/// - `UnsupportedFile`: extension not jpg/jpeg/png, or unknown magic bytes
/// - `TooLarge`: upload above the configured cap
/// - `Io`: transient file could not be written
/// - `ModelUnavailable`: OCR engine could not be built
/// - `DecodeFailure`: image bytes are corrupt
/// - `OcrFailure`: engine call failed or the worker panicked
pub async fn handle_upload(
    state: &AppState,
    upload: Option<UploadedImage>,
) -> Result<Page, PageError> {
    let upload = match upload {
        Some(upload) if !upload.is_empty() => upload,
        _ => {
            debug!("No file uploaded");
            return Ok(Page::AwaitingUpload);
        }
    };

    let request_id = Uuid::new_v4();
    info!(
        %request_id,
        "Upload received: {} ({} bytes)",
        upload.file_name,
        upload.bytes.len()
    );

    let result = process_upload(state, upload, request_id).await;
    if let Err(e) = &result {
        warn!(%request_id, error_type = e.error_type(), "Upload failed: {}", e);
    }
    result
}

async fn process_upload(
    state: &AppState,
    upload: UploadedImage,
    request_id: Uuid,
) -> Result<Page, PageError> {
    // 1. Validate
    check_extension(&upload.file_name)?;
    let max = state.config.max_upload_bytes;
    if upload.bytes.len() > max {
        return Err(PageError::TooLarge { max });
    }
    let format = detect_format(&upload.bytes)?;

    // 2. Transient copy for the engine
    let extension = format.extensions_str().first().copied().unwrap_or("img");
    let transient =
        TransientFile::create(&upload.bytes, extension, state.config.temp_dir.as_deref())?;
    debug!(%request_id, "Upload written to {}", transient.path().display());

    // 3. Engine (built on first use)
    let reader = state
        .loader
        .get()
        .await
        .map_err(PageError::ModelUnavailable)?;

    // 4. OCR and drawing off the async workers
    let annotator = Arc::clone(&state.annotator);
    let path = transient.path().to_path_buf();
    let (annotated, detections) =
        tokio::task::spawn_blocking(move || annotator.annotate(&path, &*reader))
            .await
            .map_err(|e| PageError::OcrFailure(format!("OCR worker failed: {}", e)))??;

    info!(%request_id, "Detected {} text regions", detections.len());

    // 5. Results page
    let annotated_png = encode_png(&annotated)?;
    let view = ResultsView {
        file_name: upload.file_name,
        original: ImagePane {
            caption: ORIGINAL_LABEL,
            data_uri: to_data_uri(&upload.bytes, mime_type(format)),
        },
        annotated: ImagePane {
            caption: ANNOTATED_LABEL,
            data_uri: to_data_uri(&annotated_png, mime_type(image::ImageFormat::Png)),
        },
        extracted: ExtractedText::from_detections(&detections),
    };

    // 6. Cleanup
    if let Err(e) = transient.close() {
        warn!(%request_id, "Failed to remove transient upload: {}", e);
    }

    Ok(Page::Results(view))
}

/// Pull the `file` field out of the submitted form
///
/// A body cut off by the request size limit is reported as `TooLarge`
/// against `max_upload_bytes`.
pub async fn read_upload(
    mut multipart: Multipart,
    max_upload_bytes: usize,
) -> Result<Option<UploadedImage>, PageError> {
    let form_error = |e: MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            PageError::TooLarge {
                max: max_upload_bytes,
            }
        } else {
            PageError::InvalidForm(e.to_string())
        }
    };

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(form_error)?;
        return Ok(Some(UploadedImage::new(file_name, bytes.to_vec())));
    }
    Ok(None)
}

/// GET / - upload form
pub async fn index_handler() -> Html<String> {
    Html(render_html(&Page::AwaitingUpload))
}

/// POST / - run OCR on the uploaded image
pub async fn upload_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Html<String>, PageError> {
    let upload = read_upload(multipart, state.config.max_upload_bytes).await?;
    let page = handle_upload(&state, upload).await?;
    Ok(Html(render_html(&page)))
}

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model_loaded: state.loader.is_loaded(),
    })
}
