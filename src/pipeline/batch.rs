//! 複数画像のバッチ処理。

use rayon::prelude::*;
use tracing::info;

use super::preprocessor::{PreprocessFailure, ProcessingOutcome, preprocess};
use crate::config::merged::PreprocessOverrides;
use crate::config::settings::Settings;
use crate::ocr::OcrEngine;

/// One image in a batch submission.
#[derive(Debug, Clone)]
pub struct BatchInput {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Preprocess several images in parallel.
///
/// Each image's pipeline run is fully independent, so the batch fans out
/// over a worker pool. Results come back in input order and each result's
/// debug frames keep their own internal ordering.
pub fn preprocess_batch(
    engine: &dyn OcrEngine,
    settings: &Settings,
    inputs: &[BatchInput],
    overrides: &PreprocessOverrides,
) -> Vec<Result<ProcessingOutcome, PreprocessFailure>> {
    info!(count = inputs.len(), "starting batch preprocessing");
    inputs
        .par_iter()
        .map(|input| preprocess(engine, settings, &input.bytes, &input.mime_type, overrides))
        .collect()
}
