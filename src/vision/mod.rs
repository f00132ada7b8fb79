// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing: OCR engine, engine loading and result annotation
//!
//! This module provides:
//! - OCR via PaddleOCR ONNX models (CPU only)
//! - A process-wide cached engine loader
//! - Drawing detected boxes and labels onto uploaded images

pub mod annotate;
pub mod image_utils;
pub mod model_manager;
pub mod ocr;

pub use annotate::{detection_label, detection_rect, AnnotateError, Annotator};
pub use image_utils::{check_extension, detect_format, ImageError};
pub use model_manager::{ModelLoader, VisionModelInfo};
pub use ocr::{Detection, OcrModelConfig, SharedTextReader, TextReader};
