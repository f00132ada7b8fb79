// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload validation and encoding helpers for rendered results

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, RgbImage};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

/// Default upload cap (10MB)
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// File extensions the upload form accepts
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Unsupported file type '{0}' (expected one of: jpg, jpeg, png)")]
    UnsupportedExtension(String),

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Failed to encode image: {0}")]
    EncodeFailed(String),
}

/// Check a file name against `SUPPORTED_EXTENSIONS` (case-insensitive)
pub fn check_extension(file_name: &str) -> Result<&'static str, ImageError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    SUPPORTED_EXTENSIONS
        .iter()
        .copied()
        .find(|supported| *supported == extension)
        .ok_or_else(|| {
            if extension.is_empty() {
                ImageError::UnsupportedExtension(file_name.to_string())
            } else {
                ImageError::UnsupportedExtension(extension)
            }
        })
}

/// Detect PNG or JPEG from magic bytes
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    match bytes {
        [0x89, 0x50, 0x4E, 0x47, ..] => Ok(ImageFormat::Png),
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),
        _ => Err(ImageError::UnsupportedFormat),
    }
}

pub fn mime_type(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Encode an RGB image as PNG bytes
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, ImageError> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| ImageError::EncodeFailed(e.to_string()))?;
    Ok(buffer.into_inner())
}

/// `data:` URI for embedding image bytes directly into a page
pub fn to_data_uri(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}
