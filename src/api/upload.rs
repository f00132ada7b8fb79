// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Uploaded files and the transient copy the OCR engine reads from

use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

const TEMP_PREFIX: &str = "ocr-upload-";

/// File supplied through the upload form
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// A file input submitted with nothing selected
    pub fn is_empty(&self) -> bool {
        self.file_name.is_empty() && self.bytes.is_empty()
    }
}

/// Upload bytes written to a uniquely named file for the lifetime of one
/// request. The file is removed when the guard is dropped.
#[derive(Debug)]
pub struct TransientFile {
    file: NamedTempFile,
}

impl TransientFile {
    /// Write `bytes` to a new file in `dir` (system temp dir when `None`)
    /// named with the given extension
    pub fn create(bytes: &[u8], extension: &str, dir: Option<&Path>) -> io::Result<Self> {
        let suffix = format!(".{}", extension);
        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_PREFIX).suffix(&suffix);

        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(bytes)?;
        file.flush()?;

        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Delete the file now, reporting failures that drop would ignore
    pub fn close(self) -> io::Result<()> {
        self.file.close()
    }
}
