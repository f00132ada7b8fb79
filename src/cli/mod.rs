// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use clap::Parser;
use std::path::PathBuf;

use crate::config::{ServerConfig, DEFAULT_HOST, DEFAULT_PORT};
use crate::vision::ocr::detection::DEFAULT_DETECTION_THRESHOLD;
use crate::vision::ocr::OcrModelConfig;

/// OCR Lens: upload an image and see the text detected in it
#[derive(Parser, Debug, Clone)]
#[command(name = "ocr-lens")]
#[command(version)]
#[command(about = "Web page for detecting and extracting text from images", long_about = None)]
pub struct Cli {
    /// Address to bind the HTTP server to
    #[arg(long, env = "OCR_LENS_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "OCR_LENS_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Directory containing det_model.onnx, rec_model.onnx and en_dict.txt
    #[arg(long, env = "OCR_MODEL_DIR", default_value = "./models/paddleocr-onnx")]
    pub model_dir: PathBuf,

    /// TrueType font for box labels (falls back to common system fonts)
    #[arg(long, env = "OCR_FONT_PATH")]
    pub font_path: Option<PathBuf>,

    /// Largest accepted upload in bytes
    #[arg(long, env = "OCR_MAX_UPLOAD_BYTES", default_value_t = 10 * 1024 * 1024)]
    pub max_upload_bytes: usize,

    /// Directory for transient upload files
    #[arg(long, env = "OCR_TEMP_DIR")]
    pub temp_dir: Option<PathBuf>,

    /// Probability threshold for the text detection map
    #[arg(long, env = "OCR_DET_THRESHOLD", default_value_t = DEFAULT_DETECTION_THRESHOLD)]
    pub det_threshold: f32,

    /// ONNX Runtime intra-op threads per session
    #[arg(long, env = "OCR_THREADS", default_value_t = 4)]
    pub threads: usize,

    /// Build the OCR engine on the first upload instead of at startup
    #[arg(long, env = "OCR_LAZY_MODEL")]
    pub lazy_model: bool,
}

impl Cli {
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            max_upload_bytes: self.max_upload_bytes,
            temp_dir: self.temp_dir.clone(),
        }
    }

    pub fn ocr_config(&self) -> OcrModelConfig {
        OcrModelConfig {
            model_dir: self.model_dir.clone(),
            detection_threshold: self.det_threshold,
            intra_threads: self.threads,
            ..OcrModelConfig::default()
        }
    }
}
