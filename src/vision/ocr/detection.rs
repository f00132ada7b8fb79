// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR text detection model
//!
//! Runs the DB detection network and turns its probability map into
//! axis-aligned text boxes in model input space.

use anyhow::{anyhow, Context, Result};
use ndarray::{Array4, ArrayViewD, IxDyn};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Default probability threshold for a pixel to count as text
pub const DEFAULT_DETECTION_THRESHOLD: f32 = 0.3;

/// Regions with fewer pixels than this are treated as noise
pub const MIN_REGION_PIXELS: usize = 10;

/// A detected text box in detection-model input space
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Mean text probability over the region's pixels
    pub confidence: f32,
}

impl TextBox {
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.confidence > 0.0
    }

    /// Corners in model order: top-left, top-right, bottom-right, bottom-left
    pub fn corners(&self) -> [[f32; 2]; 4] {
        let (x0, y0) = (self.x, self.y);
        let (x1, y1) = (self.x + self.width, self.y + self.height);
        [[x0, y0], [x1, y0], [x1, y1], [x0, y1]]
    }
}

/// PaddleOCR text detection model (CPU only)
#[derive(Clone)]
pub struct OcrDetectionModel {
    session: Arc<Mutex<Session>>,
    input_name: String,
    threshold: f32,
}

impl std::fmt::Debug for OcrDetectionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrDetectionModel")
            .field("input_name", &self.input_name)
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

impl OcrDetectionModel {
    /// Load the detection model (`det_model.onnx`)
    ///
    /// # Errors
    /// Returns error if the file is missing or ONNX Runtime cannot build a
    /// session from it.
    pub async fn new<P: AsRef<Path>>(model_path: P, intra_threads: usize) -> Result<Self> {
        let model_path = model_path.as_ref();
        if !model_path.exists() {
            anyhow::bail!("OCR detection model not found: {}", model_path.display());
        }

        info!("Loading OCR detection model from {}", model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .with_context(|| {
                format!(
                    "Failed to load OCR detection model from {}",
                    model_path.display()
                )
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "x".to_string());

        debug!("Detection model input: {}", input_name);
        info!("OCR detection model loaded (CPU-only)");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            threshold: DEFAULT_DETECTION_THRESHOLD,
        })
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Run detection on a tensor from `preprocess_for_detection()`
    pub fn detect(&self, input: &Array4<f32>) -> Result<Vec<TextBox>> {
        let shape = input.shape();
        if shape[0] != 1 || shape[1] != 3 {
            anyhow::bail!("Invalid input shape: {:?}, expected [1, 3, H, W]", shape);
        }
        let (input_height, input_width) = (shape[2], shape[3]);

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("OCR detection session lock poisoned"))?;

        let input_value =
            Value::from_array(input.to_owned()).context("Failed to create input tensor")?;
        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("Detection inference failed")?;

        let probability_map = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;
        debug!("Detection output shape: {:?}", probability_map.shape());

        let boxes = extract_text_boxes(
            probability_map.view(),
            input_height,
            input_width,
            self.threshold,
        )?;
        debug!("Detected {} text regions", boxes.len());

        Ok(boxes)
    }
}

/// Group above-threshold pixels of a probability map into text boxes
///
/// Accepts `[1, 1, H, W]` or `[1, H, W]` maps. Pixels are grouped by
/// 4-connectivity; the box of every group of at least `MIN_REGION_PIXELS`
/// pixels is scaled to the model input size. Boxes come back sorted
/// top-to-bottom, then left-to-right.
pub fn extract_text_boxes(
    map: ArrayViewD<f32>,
    input_height: usize,
    input_width: usize,
    threshold: f32,
) -> Result<Vec<TextBox>> {
    let (height, width) = match map.shape() {
        [1, 1, h, w] => (*h, *w),
        [1, h, w] => (*h, *w),
        other => anyhow::bail!("Unexpected probability map shape: {:?}", other),
    };
    let four_d = map.ndim() == 4;
    let prob = |x: usize, y: usize| {
        if four_d {
            map[IxDyn(&[0, 0, y, x])]
        } else {
            map[IxDyn(&[0, y, x])]
        }
    };

    let scale_x = input_width as f32 / width.max(1) as f32;
    let scale_y = input_height as f32 / height.max(1) as f32;

    let mut visited = vec![false; width * height];
    let mut boxes = Vec::new();
    let mut stack = Vec::new();

    for start_y in 0..height {
        for start_x in 0..width {
            if visited[start_y * width + start_x] || prob(start_x, start_y) < threshold {
                continue;
            }

            let (mut min_x, mut max_x, mut min_y, mut max_y) = (start_x, start_x, start_y, start_y);
            let mut count = 0usize;
            let mut sum = 0.0f32;

            visited[start_y * width + start_x] = true;
            stack.push((start_x, start_y));

            while let Some((x, y)) = stack.pop() {
                count += 1;
                sum += prob(x, y);
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);

                let neighbours = [
                    (x.wrapping_sub(1), y),
                    (x + 1, y),
                    (x, y.wrapping_sub(1)),
                    (x, y + 1),
                ];
                for (nx, ny) in neighbours {
                    if nx < width
                        && ny < height
                        && !visited[ny * width + nx]
                        && prob(nx, ny) >= threshold
                    {
                        visited[ny * width + nx] = true;
                        stack.push((nx, ny));
                    }
                }
            }

            if count >= MIN_REGION_PIXELS {
                boxes.push(TextBox {
                    x: min_x as f32 * scale_x,
                    y: min_y as f32 * scale_y,
                    width: (max_x - min_x + 1) as f32 * scale_x,
                    height: (max_y - min_y + 1) as f32 * scale_y,
                    confidence: sum / count as f32,
                });
            }
        }
    }

    boxes.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));
    Ok(boxes)
}
