// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Parser;
use ocr_lens::{
    api::{start_server, AppState},
    cli::Cli,
    vision::{Annotator, ModelLoader},
};
use std::env;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    info!("🚀 Starting OCR Lens v{}", env!("CARGO_PKG_VERSION"));

    let ocr_config = cli.ocr_config();
    info!("📁 OCR models: {}", ocr_config.model_dir.display());
    let loader = ModelLoader::new(ocr_config);

    if cli.lazy_model {
        info!("OCR engine will be loaded on first upload");
    } else if !loader.preload().await {
        warn!("Continuing without OCR engine; uploads will retry loading it");
    }

    let annotator = Annotator::new(cli.font_path.as_deref());
    let state = AppState::new(loader, annotator, cli.server_config());

    start_server(state).await
}
