// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR text recognition model
//!
//! Reads the text out of a single cropped line with a CTC recognition
//! network and greedy decoding.

use anyhow::{anyhow, Context, Result};
use ndarray::{Array4, ArrayViewD, IxDyn};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::preprocessing::{REC_INPUT_HEIGHT, REC_MIN_WIDTH};

/// Index of the CTC blank token in the model's class axis
const CTC_BLANK: usize = 0;

/// Text read from one cropped region
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedText {
    pub text: String,
    /// Mean of the per-character probabilities, in [0, 1]
    pub confidence: f32,
    pub char_confidences: Vec<f32>,
}

impl RecognizedText {
    pub fn new(text: String, confidence: f32) -> Self {
        Self {
            text,
            confidence,
            char_confidences: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// PaddleOCR text recognition model (CPU only)
#[derive(Clone)]
pub struct OcrRecognitionModel {
    session: Arc<Mutex<Session>>,
    /// Class index -> character, with the CTC blank at index 0
    dictionary: Arc<Vec<char>>,
    input_name: String,
}

impl std::fmt::Debug for OcrRecognitionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrRecognitionModel")
            .field("dictionary_size", &self.dictionary.len())
            .field("input_name", &self.input_name)
            .finish_non_exhaustive()
    }
}

impl OcrRecognitionModel {
    /// Load the recognition model (`rec_model.onnx`) and its character
    /// dictionary (`en_dict.txt`)
    ///
    /// # Errors
    /// Returns error if either file is missing or the session cannot be built.
    pub async fn new<P: AsRef<Path>>(
        model_path: P,
        dict_path: P,
        intra_threads: usize,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        let dict_path = dict_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("OCR recognition model not found: {}", model_path.display());
        }
        if !dict_path.exists() {
            anyhow::bail!(
                "OCR character dictionary not found: {}",
                dict_path.display()
            );
        }

        info!(
            "Loading OCR recognition model from {}",
            model_path.display()
        );

        let dictionary = load_dictionary(dict_path)?;
        info!(
            "Loaded character dictionary with {} characters",
            dictionary.len()
        );

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .with_context(|| {
                format!(
                    "Failed to load OCR recognition model from {}",
                    model_path.display()
                )
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "x".to_string());

        info!("OCR recognition model loaded (CPU-only)");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            dictionary: Arc::new(dictionary),
            input_name,
        })
    }

    /// Recognize text from a tensor produced by `preprocess_for_recognition()`
    pub fn recognize(&self, input: &Array4<f32>) -> Result<RecognizedText> {
        let shape = input.shape();
        if shape[0] != 1
            || shape[1] != 3
            || shape[2] != REC_INPUT_HEIGHT as usize
            || shape[3] < REC_MIN_WIDTH as usize
        {
            anyhow::bail!(
                "Invalid input shape: {:?}, expected [1, 3, {}, W>={}]",
                shape,
                REC_INPUT_HEIGHT,
                REC_MIN_WIDTH
            );
        }

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("OCR recognition session lock poisoned"))?;

        let input_value =
            Value::from_array(input.to_owned()).context("Failed to create input tensor")?;
        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("Recognition inference failed")?;

        let logits = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;
        debug!("Recognition output shape: {:?}", logits.shape());

        ctc_greedy_decode(logits.view(), &self.dictionary)
    }
}

/// Read a PaddleOCR dictionary: one character per line
///
/// Index 0 is reserved for the CTC blank. A trailing space class is
/// appended when the file does not contain one, matching PaddleOCR's
/// `use_space_char` export.
pub fn load_dictionary<P: AsRef<Path>>(path: P) -> Result<Vec<char>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open dictionary: {}", path.display()))?;

    let mut dictionary = vec![' '];
    for line in BufReader::new(file).lines() {
        let line = line.context("Failed to read dictionary line")?;
        if let Some(ch) = line.chars().next() {
            dictionary.push(ch);
        }
    }

    if !dictionary[1..].contains(&' ') {
        dictionary.push(' ');
    }

    Ok(dictionary)
}

/// Best-path CTC decoding
///
/// Takes `[1, T, C]` or `[T, C]` class probabilities, picks the arg-max per
/// timestep, collapses repeats and removes blanks. Confidence is the mean
/// probability of the emitted characters.
pub fn ctc_greedy_decode(probs: ArrayViewD<f32>, dictionary: &[char]) -> Result<RecognizedText> {
    let (steps, classes) = match probs.shape() {
        [1, t, c] => (*t, *c),
        [t, c] => (*t, *c),
        other => anyhow::bail!("Unexpected recognition output shape: {:?}", other),
    };
    let three_d = probs.ndim() == 3;

    let mut text = String::new();
    let mut char_confidences = Vec::new();
    let mut previous = CTC_BLANK;

    for t in 0..steps {
        let (best, best_prob) = (0..classes)
            .map(|c| {
                let p = if three_d {
                    probs[IxDyn(&[0, t, c])]
                } else {
                    probs[IxDyn(&[t, c])]
                };
                (c, p)
            })
            .fold((CTC_BLANK, f32::NEG_INFINITY), |acc, cur| {
                if cur.1 > acc.1 {
                    cur
                } else {
                    acc
                }
            });

        if best != CTC_BLANK && best != previous {
            if let Some(&ch) = dictionary.get(best) {
                text.push(ch);
                char_confidences.push(best_prob);
            }
        }
        previous = best;
    }

    let confidence = if char_confidences.is_empty() {
        0.0
    } else {
        let mean = char_confidences.iter().sum::<f32>() / char_confidences.len() as f32;
        mean.clamp(0.0, 1.0)
    };

    Ok(RecognizedText {
        text: text.trim().to_string(),
        confidence,
        char_confidences,
    })
}
