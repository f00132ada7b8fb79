// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod errors;
pub mod handler;
pub mod http_server;
pub mod page;
pub mod upload;

pub use errors::{ErrorResponse, PageError};
pub use handler::{handle_upload, read_upload, HealthResponse, UPLOAD_FIELD};
pub use http_server::{build_router, start_server, AppState};
pub use page::{render_html, ExtractedText, ImagePane, Page, ResultsView, TextRow};
pub use upload::{TransientFile, UploadedImage};
