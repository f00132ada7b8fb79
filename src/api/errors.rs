// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use super::page::{render_html, ErrorView, Page};
use crate::vision::{AnnotateError, ImageError};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
}

/// Failures of one upload, grouped by what the user can do about them
#[derive(Debug, Error)]
pub enum PageError {
    #[error("{0}")]
    UnsupportedFile(String),

    #[error("Uploaded file is larger than the {max} byte limit")]
    TooLarge { max: usize },

    #[error("Could not decode the image: {0}")]
    DecodeFailure(String),

    #[error("OCR model unavailable: {0:#}")]
    ModelUnavailable(anyhow::Error),

    #[error("Text detection failed: {0}")]
    OcrFailure(String),

    #[error("Invalid upload form: {0}")]
    InvalidForm(String),

    #[error("Could not store the upload: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PageError {
    pub fn error_type(&self) -> &'static str {
        match self {
            PageError::UnsupportedFile(_) => "unsupported_file",
            PageError::TooLarge { .. } => "file_too_large",
            PageError::DecodeFailure(_) => "decode_failure",
            PageError::ModelUnavailable(_) => "model_unavailable",
            PageError::OcrFailure(_) => "ocr_failure",
            PageError::InvalidForm(_) => "invalid_form",
            PageError::Io(_) => "io_error",
            PageError::Internal(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            PageError::UnsupportedFile(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            PageError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            PageError::DecodeFailure(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PageError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            PageError::InvalidForm(_) => StatusCode::BAD_REQUEST,
            PageError::OcrFailure(_) | PageError::Io(_) | PageError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error_type: self.error_type().to_string(),
            message: self.to_string(),
        }
    }
}

impl From<ImageError> for PageError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::UnsupportedExtension(_) | ImageError::UnsupportedFormat => {
                PageError::UnsupportedFile(err.to_string())
            }
            ImageError::EncodeFailed(message) => PageError::Internal(message),
        }
    }
}

impl From<AnnotateError> for PageError {
    fn from(err: AnnotateError) -> Self {
        match err {
            AnnotateError::Decode { message, .. } => PageError::DecodeFailure(message),
            AnnotateError::Ocr(e) => PageError::OcrFailure(format!("{:#}", e)),
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let page = Page::Error(ErrorView::from(self.to_response()));
        (status, Html(render_html(&page))).into_response()
    }
}
