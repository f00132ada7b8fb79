// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod vision;

pub use api::{build_router, handle_upload, AppState, Page, PageError, UploadedImage};
pub use config::ServerConfig;
pub use vision::{Annotator, Detection, ModelLoader, OcrModelConfig, TextReader};
