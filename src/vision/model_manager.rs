// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Process-wide OCR engine loader
//!
//! The engine is built on first use (or eagerly via `preload`) and the same
//! instance is handed to every request afterwards. A failed build is not
//! cached; the next caller attempts it again.

use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::vision::ocr::{OcrModelConfig, PaddleOcrModel, SharedTextReader};

type ReaderFactory = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<SharedTextReader>> + Send + Sync>;

/// Information about the engine a loader serves
#[derive(Debug, Clone, PartialEq)]
pub struct VisionModelInfo {
    pub name: String,
    pub languages: Vec<String>,
    pub loaded: bool,
}

/// Lazily constructs and caches the OCR engine
pub struct ModelLoader {
    name: String,
    languages: Vec<String>,
    factory: ReaderFactory,
    reader: OnceCell<SharedTextReader>,
}

impl std::fmt::Debug for ModelLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelLoader")
            .field("name", &self.name)
            .field("languages", &self.languages)
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}

impl ModelLoader {
    /// Loader for the PaddleOCR engine described by `config`
    pub fn new(config: OcrModelConfig) -> Self {
        let languages = config.languages.clone();
        let config = Arc::new(config);
        let factory: ReaderFactory = Arc::new(move || {
            let config = Arc::clone(&config);
            async move {
                let model = PaddleOcrModel::new(&config).await?;
                Ok(Arc::new(model) as SharedTextReader)
            }
            .boxed()
        });

        Self {
            name: "paddleocr".to_string(),
            languages,
            factory,
            reader: OnceCell::new(),
        }
    }

    /// Loader backed by an arbitrary engine constructor
    pub fn from_factory<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, anyhow::Result<SharedTextReader>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            languages: vec!["en".to_string()],
            factory: Arc::new(factory),
            reader: OnceCell::new(),
        }
    }

    /// Loader that already holds a constructed engine
    pub fn with_reader(name: impl Into<String>, reader: SharedTextReader) -> Self {
        let cached = Arc::clone(&reader);
        Self {
            name: name.into(),
            languages: vec!["en".to_string()],
            factory: Arc::new(move || {
                let reader = Arc::clone(&cached);
                async move { Ok(reader) }.boxed()
            }),
            reader: OnceCell::new_with(Some(reader)),
        }
    }

    /// Return the cached engine, building it if this is the first call
    ///
    /// Concurrent first callers wait on a single construction.
    pub async fn get(&self) -> anyhow::Result<SharedTextReader> {
        let reader = self
            .reader
            .get_or_try_init(|| async {
                tracing::info!("Loading OCR engine '{}'...", self.name);
                let reader = (self.factory)().await?;
                tracing::info!("✅ OCR engine '{}' loaded", self.name);
                Ok::<_, anyhow::Error>(reader)
            })
            .await?;
        Ok(Arc::clone(reader))
    }

    /// Build the engine at startup, logging instead of failing
    pub async fn preload(&self) -> bool {
        match self.get().await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("⚠️ Failed to load OCR engine '{}': {:#}", self.name, e);
                false
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.reader.initialized()
    }

    pub fn info(&self) -> VisionModelInfo {
        VisionModelInfo {
            name: self.name.clone(),
            languages: self.languages.clone(),
            loaded: self.is_loaded(),
        }
    }
}
