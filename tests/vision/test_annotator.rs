// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Annotator tests against files on disk

use image::{Rgb, RgbImage};
use ocr_lens::vision::annotate::BOX_COLOR;
use ocr_lens::vision::{detection_rect, AnnotateError, Annotator, Detection, TextReader};
use std::path::Path;

struct Script(Vec<Detection>);

impl TextReader for Script {
    fn read_text(&self, _path: &Path) -> anyhow::Result<Vec<Detection>> {
        Ok(self.0.clone())
    }
}

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| Rgb([(x % 200) as u8, (y % 200) as u8, 90]))
}

/// Test 1: Rectangle corners follow quad[0] and quad[2] of rotated quads
#[test]
fn test_rotated_quad_uses_first_and_third_points() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rotated.png");
    gradient(120, 120).save(&path).unwrap();

    // slightly rotated box: top-left is not the minimum x
    let detection = Detection::new(
        [[30.6, 20.0], [90.0, 26.0], [84.9, 70.2], [24.0, 64.0]],
        "TILT",
        0.81,
    );
    assert_eq!(detection_rect(&detection), ((30, 20), (84, 70)));

    let (out, detections) = Annotator::without_font()
        .annotate(&path, &Script(vec![detection]))
        .unwrap();
    assert_eq!(detections.len(), 1);
    assert_eq!(*out.get_pixel(30, 45), BOX_COLOR);
    assert_eq!(*out.get_pixel(84, 45), BOX_COLOR);
    assert_eq!(*out.get_pixel(57, 20), BOX_COLOR);
    assert_eq!(*out.get_pixel(57, 70), BOX_COLOR);
}

/// Test 2: Source file is untouched and JPEG input decodes to RGB
#[test]
fn test_source_file_not_modified() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("photo.jpg");
    gradient(64, 48).save(&path).unwrap();
    let before = std::fs::read(&path).unwrap();

    let (out, _) = Annotator::without_font()
        .annotate(
            &path,
            &Script(vec![Detection::from_corners([4.0, 4.0], [30.0, 20.0], "x", 0.3)]),
        )
        .unwrap();

    assert_eq!(out.dimensions(), (64, 48));
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

/// Test 3: Missing file is a decode error
#[test]
fn test_missing_file() {
    let err = Annotator::without_font()
        .annotate(Path::new("/nonexistent/upload.png"), &Script(vec![]))
        .unwrap_err();
    assert!(matches!(err, AnnotateError::Decode { .. }));
}

/// Test 4: Labels only add pixels near their boxes
#[test]
fn test_labels_stay_near_boxes() {
    let font = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSans.ttf");
    let annotator = Annotator::from_font_file(&font).unwrap();
    assert!(annotator.has_font());

    let source = RgbImage::from_pixel(300, 200, Rgb([255, 255, 255]));
    let detection = Detection::from_corners([20.0, 100.0], [120.0, 140.0], "HELLO", 0.95);
    let out = annotator.draw(&source, &[detection]);

    // label drawn in the band above the box
    let label_pixels = (20..200)
        .flat_map(|x| (70..90).map(move |y| (x, y)))
        .filter(|&(x, y)| *out.get_pixel(x, y) != Rgb([255, 255, 255]))
        .count();
    assert!(label_pixels > 20);

    // far bottom-right corner is nowhere near the box or its label
    for x in 200..300 {
        for y in 160..200 {
            assert_eq!(*out.get_pixel(x, y), Rgb([255, 255, 255]));
        }
    }
}
