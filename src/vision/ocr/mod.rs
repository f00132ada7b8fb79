// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR integration for text extraction from images
//!
//! Components:
//! - `detection` - Text region detection
//! - `recognition` - Text recognition from detected regions
//! - `preprocessing` - Image preprocessing for models
//! - `model` - Combined pipeline and the `TextReader` engine seam

pub mod detection;
pub mod model;
pub mod preprocessing;
pub mod recognition;

pub use detection::{OcrDetectionModel, TextBox};
pub use model::{
    Detection, OcrModelConfig, PaddleOcrModel, Point, SharedTextReader, TextReader,
    SUPPORTED_LANGUAGES,
};
pub use recognition::{OcrRecognitionModel, RecognizedText};
