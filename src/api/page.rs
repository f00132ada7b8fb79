// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Page states and their HTML rendering
//!
//! Handlers build a [`Page`] describing what the user should see; only
//! [`render_html`] knows about markup. Everything derived from user input
//! (file names, recognized text, error messages) is escaped here.

use ammonia::clean_text;

use super::errors::ErrorResponse;
use crate::vision::Detection;

pub const PAGE_TITLE: &str = "Text Detection";
pub const INTRO_TEXT: &str =
    "Upload an image containing text and the app will detect and extract it.";
pub const UPLOAD_PROMPT: &str = "Please upload an image to get started.";
pub const HELP_TEXT: &str =
    "This app can detect text in various images like signs, documents, and screenshots.";
pub const SPINNER_TEXT: &str = "Detecting text...";
pub const ORIGINAL_LABEL: &str = "Original Image";
pub const ANNOTATED_LABEL: &str = "Detected Text";
pub const EXTRACTED_LABEL: &str = "Extracted Text";
pub const NO_TEXT_MESSAGE: &str = "No text detected in the image.";
pub const ACCEPTED_FILES: &str = ".jpg,.jpeg,.png";

/// Image shown in one of the two result columns
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePane {
    pub caption: &'static str,
    pub data_uri: String,
}

/// One row of the extracted text table
#[derive(Debug, Clone, PartialEq)]
pub struct TextRow {
    /// 1-based position in engine order
    pub number: usize,
    pub text: String,
    /// Confidence formatted with two decimals
    pub confidence: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedText {
    Table(Vec<TextRow>),
    NoText,
}

impl ExtractedText {
    pub fn from_detections(detections: &[Detection]) -> Self {
        if detections.is_empty() {
            ExtractedText::NoText
        } else {
            ExtractedText::Table(build_rows(detections))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultsView {
    pub file_name: String,
    pub original: ImagePane,
    pub annotated: ImagePane,
    pub extracted: ExtractedText,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorView {
    pub error_type: String,
    pub message: String,
}

impl From<ErrorResponse> for ErrorView {
    fn from(response: ErrorResponse) -> Self {
        Self {
            error_type: response.error_type,
            message: response.message,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    AwaitingUpload,
    Results(ResultsView),
    Error(ErrorView),
}

pub fn build_rows(detections: &[Detection]) -> Vec<TextRow> {
    detections
        .iter()
        .enumerate()
        .map(|(i, detection)| TextRow {
            number: i + 1,
            text: detection.text.clone(),
            confidence: format!("{:.2}", detection.confidence),
        })
        .collect()
}

pub fn render_html(page: &Page) -> String {
    let body = match page {
        Page::AwaitingUpload => format!(
            r#"<div class="info">{}</div>
<p class="help">{}</p>"#,
            UPLOAD_PROMPT, HELP_TEXT
        ),
        Page::Results(view) => render_results(view),
        Page::Error(view) => format!(
            r#"<div class="error"><strong>{}</strong>: {}</div>"#,
            clean_text(&view.error_type),
            clean_text(&view.message)
        ),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{style}</style>
</head>
<body>
<h1>{title}</h1>
<p>{intro}</p>
{form}
{body}
</body>
</html>
"#,
        title = PAGE_TITLE,
        style = STYLE,
        intro = INTRO_TEXT,
        form = render_form(),
        body = body
    )
}

fn render_form() -> String {
    format!(
        r#"<form method="post" action="/" enctype="multipart/form-data" onsubmit="document.getElementById('spinner').style.display='block'">
<input type="file" name="file" accept="{accept}">
<button type="submit">Upload</button>
</form>
<div id="spinner" class="spinner">{spinner}</div>"#,
        accept = ACCEPTED_FILES,
        spinner = SPINNER_TEXT
    )
}

fn render_results(view: &ResultsView) -> String {
    let extracted = match &view.extracted {
        ExtractedText::NoText => format!(r#"<p class="empty">{}</p>"#, NO_TEXT_MESSAGE),
        ExtractedText::Table(rows) => {
            let mut table = String::from(
                "<table>\n<thead><tr><th>No.</th><th>Text</th><th>Confidence</th></tr></thead>\n<tbody>\n",
            );
            for row in rows {
                table.push_str(&format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                    row.number,
                    clean_text(&row.text),
                    row.confidence
                ));
            }
            table.push_str("</tbody>\n</table>");
            table
        }
    };

    format!(
        r#"<p class="file">{file}</p>
<div class="columns">
{original}
{annotated}
</div>
<h2>{extracted_label}</h2>
{extracted}"#,
        file = clean_text(&view.file_name),
        original = render_pane(&view.original),
        annotated = render_pane(&view.annotated),
        extracted_label = EXTRACTED_LABEL,
        extracted = extracted
    )
}

fn render_pane(pane: &ImagePane) -> String {
    format!(
        r#"<div class="column">
<h2>{caption}</h2>
<img src="{src}" alt="{caption}">
</div>"#,
        caption = pane.caption,
        src = pane.data_uri
    )
}

const STYLE: &str = "body{font-family:sans-serif;max-width:1100px;margin:2rem auto;padding:0 1rem}\
.columns{display:flex;gap:1.5rem}\
.column{flex:1;min-width:0}\
.column img{max-width:100%;height:auto}\
.info{background:#e8f1fb;border-radius:4px;padding:.75rem 1rem}\
.error{background:#fdecea;border-radius:4px;padding:.75rem 1rem}\
.spinner{display:none;margin:.5rem 0;color:#555}\
table{border-collapse:collapse;width:100%}\
th,td{border-bottom:1px solid #ddd;padding:.4rem;text-align:left}";
