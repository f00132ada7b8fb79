// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection overlay: boxes and "text (confidence)" labels drawn on a copy
//! of the uploaded image

use ab_glyph::FontVec;
use anyhow::Context;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::vision::ocr::{Detection, TextReader};

pub const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Rectangle line thickness in pixels
pub const BOX_THICKNESS: i32 = 3;

/// Label glyph height in pixels
pub const LABEL_SCALE: f32 = 20.0;

/// Gap between the label baseline and the top edge of its box
pub const LABEL_OFFSET: i32 = 10;

/// Fonts tried when no font path is configured
const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error("Failed to decode image {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("OCR failed: {0:#}")]
    Ocr(anyhow::Error),
}

/// Corners of the box drawn for a detection: the first and third quad
/// points, truncated to integers
pub fn detection_rect(detection: &Detection) -> ((i32, i32), (i32, i32)) {
    let [x0, y0] = detection.quad[0];
    let [x1, y1] = detection.quad[2];
    ((x0 as i32, y0 as i32), (x1 as i32, y1 as i32))
}

/// Label drawn above each box
pub fn detection_label(detection: &Detection) -> String {
    format!("{} ({:.2})", detection.text, detection.confidence)
}

/// Draws detection overlays; holds the label font
pub struct Annotator {
    font: Option<FontVec>,
}

impl std::fmt::Debug for Annotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Annotator")
            .field("has_font", &self.font.is_some())
            .finish()
    }
}

impl Annotator {
    /// Load the label font from `font_path`, falling back to common system
    /// fonts. Without any font, boxes are still drawn but labels are skipped.
    pub fn new(font_path: Option<&Path>) -> Self {
        let font = font_path
            .and_then(|path| {
                let font = load_font(path);
                if font.is_none() {
                    warn!("Could not load label font from {}", path.display());
                }
                font
            })
            .or_else(|| SYSTEM_FONT_PATHS.iter().find_map(|p| load_font(Path::new(p))));

        if font.is_some() {
            info!("Label font loaded");
        } else {
            warn!("⚠️ No label font found, detections will be drawn without text labels");
        }

        Self { font }
    }

    /// Annotator using exactly the font at `path`, with no fallback
    pub fn from_font_file(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read font {}", path.display()))?;
        let font = FontVec::try_from_vec(data)
            .with_context(|| format!("Invalid font file {}", path.display()))?;
        Ok(Self { font: Some(font) })
    }

    pub fn without_font() -> Self {
        Self { font: None }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Read the image at `path`, run `reader` over it and draw the results
    ///
    /// Returns the annotated RGB image together with the detections in
    /// engine order. The file itself is never modified. The reader gets the
    /// path, not the decoded pixels, so a path-based engine decodes the file
    /// a second time.
    pub fn annotate(
        &self,
        path: &Path,
        reader: &dyn TextReader,
    ) -> Result<(RgbImage, Vec<Detection>), AnnotateError> {
        let image = image::open(path)
            .map_err(|e| AnnotateError::Decode {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
            .to_rgb8();

        let detections = reader.read_text(path).map_err(AnnotateError::Ocr)?;
        debug!("Drawing {} detections", detections.len());

        Ok((self.draw(&image, &detections), detections))
    }

    /// Draw one box and label per detection on a copy of `image`
    pub fn draw(&self, image: &RgbImage, detections: &[Detection]) -> RgbImage {
        let mut canvas = image.clone();

        for detection in detections {
            let ((x0, y0), (x1, y1)) = detection_rect(detection);
            draw_thick_rect(&mut canvas, (x0.min(x1), y0.min(y1)), (x0.max(x1), y0.max(y1)));

            if let Some(font) = &self.font {
                let label_y = (y0 - LABEL_OFFSET - LABEL_SCALE as i32).max(0);
                draw_text_mut(
                    &mut canvas,
                    BOX_COLOR,
                    x0,
                    label_y,
                    LABEL_SCALE,
                    font,
                    &detection_label(detection),
                );
            }
        }

        canvas
    }
}

/// Rectangle outline `BOX_THICKNESS` pixels wide, centered on the edges
/// between `top_left` and `bottom_right` (inclusive)
fn draw_thick_rect(canvas: &mut RgbImage, top_left: (i32, i32), bottom_right: (i32, i32)) {
    let half = BOX_THICKNESS / 2;
    let width = bottom_right.0 - top_left.0 + 1;
    let height = bottom_right.1 - top_left.1 + 1;

    for t in -half..=(BOX_THICKNESS - 1 - half) {
        let w = (width + 2 * t).max(1) as u32;
        let h = (height + 2 * t).max(1) as u32;
        let rect = Rect::at(top_left.0 - t, top_left.1 - t).of_size(w, h);
        draw_hollow_rect_mut(canvas, rect, BOX_COLOR);
    }
}

fn load_font(path: &Path) -> Option<FontVec> {
    let data = std::fs::read(path).ok()?;
    FontVec::try_from_vec(data).ok()
}
