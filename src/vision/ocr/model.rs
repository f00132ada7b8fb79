// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR pipeline behind the `TextReader` seam

use anyhow::{Context, Result};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::detection::{OcrDetectionModel, DEFAULT_DETECTION_THRESHOLD};
use super::preprocessing::{
    crop_region, preprocess_for_detection, preprocess_for_recognition, PreprocessInfo,
    OCR_INPUT_SIZE,
};
use super::recognition::OcrRecognitionModel;

/// Languages the bundled PaddleOCR models can read
pub const SUPPORTED_LANGUAGES: &[&str] = &["en"];

pub const DETECTION_MODEL_FILE: &str = "det_model.onnx";
pub const RECOGNITION_MODEL_FILE: &str = "rec_model.onnx";
pub const DICTIONARY_FILE: &str = "en_dict.txt";

/// A corner of a detected region, in original image pixels
pub type Point = [f32; 2];

/// One recognized text region
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Four corners as returned by the engine (clockwise from top-left)
    pub quad: [Point; 4],
    pub text: String,
    /// Recognition confidence in [0, 1]
    pub confidence: f32,
}

impl Detection {
    pub fn new(quad: [Point; 4], text: impl Into<String>, confidence: f32) -> Self {
        Self {
            quad,
            text: text.into(),
            confidence,
        }
    }

    /// Axis-aligned quad from two corners, handy for tests and fixtures
    pub fn from_corners(
        top_left: Point,
        bottom_right: Point,
        text: impl Into<String>,
        confidence: f32,
    ) -> Self {
        let [x0, y0] = top_left;
        let [x1, y1] = bottom_right;
        Self::new([[x0, y0], [x1, y0], [x1, y1], [x0, y1]], text, confidence)
    }
}

/// An OCR engine: reads the text regions of the image stored at `path`
///
/// Implementations must be safe to share between requests; the cached
/// engine is only ever used through `&self`.
#[cfg_attr(test, mockall::automock)]
pub trait TextReader: Send + Sync {
    fn read_text(&self, path: &Path) -> Result<Vec<Detection>>;
}

/// Engine shared across requests
pub type SharedTextReader = Arc<dyn TextReader>;

/// Settings for building the PaddleOCR engine
#[derive(Debug, Clone)]
pub struct OcrModelConfig {
    /// Directory holding det_model.onnx, rec_model.onnx and en_dict.txt
    pub model_dir: PathBuf,
    pub languages: Vec<String>,
    pub detection_threshold: f32,
    pub intra_threads: usize,
}

impl Default for OcrModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("./models/paddleocr-onnx"),
            languages: vec!["en".to_string()],
            detection_threshold: DEFAULT_DETECTION_THRESHOLD,
            intra_threads: 4,
        }
    }
}

impl OcrModelConfig {
    pub fn detection_model_path(&self) -> PathBuf {
        self.model_dir.join(DETECTION_MODEL_FILE)
    }

    pub fn recognition_model_path(&self) -> PathBuf {
        self.model_dir.join(RECOGNITION_MODEL_FILE)
    }

    pub fn dictionary_path(&self) -> PathBuf {
        self.model_dir.join(DICTIONARY_FILE)
    }

    /// Reject language sets the bundled models cannot read
    pub fn validate_languages(&self) -> Result<()> {
        if self.languages.is_empty() {
            anyhow::bail!("At least one OCR language is required");
        }
        if let Some(unsupported) = self
            .languages
            .iter()
            .find(|lang| !SUPPORTED_LANGUAGES.contains(&lang.as_str()))
        {
            anyhow::bail!(
                "Unsupported OCR language '{}' (supported: {})",
                unsupported,
                SUPPORTED_LANGUAGES.join(", ")
            );
        }
        Ok(())
    }
}

/// PaddleOCR detection + recognition, CPU only
#[derive(Debug, Clone)]
pub struct PaddleOcrModel {
    detector: OcrDetectionModel,
    recognizer: OcrRecognitionModel,
}

impl PaddleOcrModel {
    /// Load both PaddleOCR models from `config.model_dir`
    pub async fn new(config: &OcrModelConfig) -> Result<Self> {
        config.validate_languages()?;
        debug!("Loading PaddleOCR models from {}", config.model_dir.display());

        let detector =
            OcrDetectionModel::new(config.detection_model_path(), config.intra_threads)
                .await?
                .with_threshold(config.detection_threshold);
        let recognizer = OcrRecognitionModel::new(
            config.recognition_model_path(),
            config.dictionary_path(),
            config.intra_threads,
        )
        .await?;

        info!(
            "PaddleOCR ready (languages: {}, threshold: {:.2})",
            config.languages.join(","),
            detector.threshold()
        );

        Ok(Self {
            detector,
            recognizer,
        })
    }

    /// Run detection and recognition over an already decoded image
    pub fn process(&self, image: &DynamicImage) -> Result<Vec<Detection>> {
        let start = Instant::now();

        let info = PreprocessInfo::new(image, OCR_INPUT_SIZE);
        let boxes = self.detector.detect(&preprocess_for_detection(image))?;

        let mut detections = Vec::with_capacity(boxes.len());
        for text_box in boxes.iter().filter(|b| b.is_valid()) {
            let quad = text_box
                .corners()
                .map(|[x, y]| {
                    let (ox, oy) = info.map_to_original(x, y);
                    [ox, oy]
                });

            let Some(crop) = crop_region(image, quad[0][0], quad[0][1], quad[2][0], quad[2][1])
            else {
                continue;
            };

            let recognized = self
                .recognizer
                .recognize(&preprocess_for_recognition(&crop))?;
            if recognized.is_empty() {
                continue;
            }

            detections.push(Detection::new(quad, recognized.text, recognized.confidence));
        }

        debug!(
            "OCR pipeline: {} boxes, {} detections in {}ms",
            boxes.len(),
            detections.len(),
            start.elapsed().as_millis()
        );
        Ok(detections)
    }
}

impl TextReader for PaddleOcrModel {
    /// Decodes the file itself, so callers that already hold the decoded
    /// image pay for a second decode; use `process` directly to avoid it.
    fn read_text(&self, path: &Path) -> Result<Vec<Detection>> {
        let image = image::open(path)
            .with_context(|| format!("Failed to open image {}", path.display()))?;
        self.process(&image)
    }
}
