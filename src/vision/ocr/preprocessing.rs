// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for the PaddleOCR detection and recognition models

use image::{imageops, DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::Array4;

/// Square input size of the detection model
pub const OCR_INPUT_SIZE: u32 = 640;

/// Recognition model input height (PP-OCR English models use 48)
pub const REC_INPUT_HEIGHT: u32 = 48;

/// Maximum width for recognition model input
pub const REC_MAX_WIDTH: u32 = 320;

/// Minimum width for recognition model input
pub const REC_MIN_WIDTH: u32 = 4;

/// Mean values for normalization (ImageNet)
pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// Std values for normalization (ImageNet)
pub const STD: [f32; 3] = [0.229, 0.224, 0.225];

const PAD_GRAY: Rgb<u8> = Rgb([128, 128, 128]);

/// Preprocess a full page for text detection
///
/// The image is letterboxed into an `OCR_INPUT_SIZE` square (gray padding,
/// centered) and normalized into an NCHW tensor `[1, 3, 640, 640]`.
/// Use [`PreprocessInfo`] with the same image to map detections back.
pub fn preprocess_for_detection(image: &DynamicImage) -> Array4<f32> {
    let padded = resize_with_padding(image, OCR_INPUT_SIZE);
    to_normalized_tensor(&padded)
}

/// Preprocess a cropped text line for recognition
///
/// Height is fixed to `REC_INPUT_HEIGHT`; width follows the aspect ratio and
/// is kept within `[REC_MIN_WIDTH, REC_MAX_WIDTH]`.
pub fn preprocess_for_recognition(image: &DynamicImage) -> Array4<f32> {
    let (w, h) = image.dimensions();
    let scale = REC_INPUT_HEIGHT as f32 / h.max(1) as f32;
    let width = ((w as f32 * scale).round() as u32).clamp(REC_MIN_WIDTH, REC_MAX_WIDTH);

    let resized = image
        .resize_exact(width, REC_INPUT_HEIGHT, imageops::FilterType::Lanczos3)
        .to_rgb8();
    to_normalized_tensor(&resized)
}

/// Scale `image` to fit a `target_size` square and pad the rest with gray
pub fn resize_with_padding(image: &DynamicImage, target_size: u32) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(target_size, target_size, PAD_GRAY);

    let info = PreprocessInfo::new(image, target_size);
    if info.original_width == 0 || info.original_height == 0 {
        return canvas;
    }

    let (new_w, new_h) = info.scaled_size();
    let resized = image
        .resize_exact(new_w, new_h, imageops::FilterType::Lanczos3)
        .to_rgb8();
    imageops::replace(
        &mut canvas,
        &resized,
        info.offset_x as i64,
        info.offset_y as i64,
    );
    canvas
}

/// Convert RGB pixels into a normalized `[1, 3, H, W]` tensor
fn to_normalized_tensor(rgb: &RgbImage) -> Array4<f32> {
    let (w, h) = rgb.dimensions();
    Array4::from_shape_fn((1, 3, h as usize, w as usize), |(_, c, y, x)| {
        let value = rgb.get_pixel(x as u32, y as u32)[c] as f32 / 255.0;
        (value - MEAN[c]) / STD[c]
    })
}

/// Crop an axis-aligned region out of the original image
///
/// Coordinates are clamped to the image; returns `None` when the clamped
/// region is empty.
pub fn crop_region(
    image: &DynamicImage,
    x_min: f32,
    y_min: f32,
    x_max: f32,
    y_max: f32,
) -> Option<DynamicImage> {
    let (w, h) = image.dimensions();
    let x0 = x_min.max(0.0).floor() as u32;
    let y0 = y_min.max(0.0).floor() as u32;
    let x1 = (x_max.ceil().max(0.0) as u32).min(w);
    let y1 = (y_max.ceil().max(0.0) as u32).min(h);

    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(image.crop_imm(x0, y0, x1 - x0, y1 - y0))
}

/// Scale factor and padding offsets used while letterboxing
///
/// Maps coordinates in detection-model space back onto the uploaded image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreprocessInfo {
    pub scale: f32,
    pub offset_x: u32,
    pub offset_y: u32,
    pub original_width: u32,
    pub original_height: u32,
}

impl PreprocessInfo {
    pub fn new(image: &DynamicImage, target_size: u32) -> Self {
        let (orig_w, orig_h) = image.dimensions();
        if orig_w == 0 || orig_h == 0 {
            return Self {
                scale: 1.0,
                offset_x: 0,
                offset_y: 0,
                original_width: orig_w,
                original_height: orig_h,
            };
        }

        let scale = (target_size as f32 / orig_w as f32).min(target_size as f32 / orig_h as f32);
        let new_w = ((orig_w as f32 * scale).round() as u32).clamp(1, target_size);
        let new_h = ((orig_h as f32 * scale).round() as u32).clamp(1, target_size);

        Self {
            scale,
            offset_x: (target_size - new_w) / 2,
            offset_y: (target_size - new_h) / 2,
            original_width: orig_w,
            original_height: orig_h,
        }
    }

    /// Size of the image content inside the padded square
    pub fn scaled_size(&self) -> (u32, u32) {
        let w = ((self.original_width as f32 * self.scale).round() as u32).max(1);
        let h = ((self.original_height as f32 * self.scale).round() as u32).max(1);
        (w, h)
    }

    /// Map a point from detection-model space to original image space,
    /// clamped to the image bounds
    pub fn map_to_original(&self, x: f32, y: f32) -> (f32, f32) {
        let orig_x = (x - self.offset_x as f32) / self.scale;
        let orig_y = (y - self.offset_y as f32) / self.scale;
        (
            orig_x.clamp(0.0, self.original_width as f32),
            orig_y.clamp(0.0, self.original_height as f32),
        )
    }
}
