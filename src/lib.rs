//! worksheet_prep: 撮影されたワークシート画像の前処理エンジン。
//!
//! Given an uploaded photo of a worksheet or textbook page, the pipeline
//! corrects orientation, isolates the text region with two competing
//! trimming strategies, and produces a display/Vision-ready image plus an
//! OCR-ready binarized image.

pub mod config;
pub mod debug_sink;
pub mod error;
pub mod ocr;
pub mod ops;
pub mod orient;
pub mod pipeline;
pub mod trim;

pub use config::merged::PreprocessOverrides;
pub use config::settings::Settings;
pub use config::trim::{OcrTrimParams, TrimParams, TrimStrategy};
pub use debug_sink::{DebugFrame, DebugSink};
pub use error::{PrepError, Result};
pub use ocr::{NullOcrEngine, OcrEngine, TesseractEngine, TextBox};
pub use pipeline::{EncodedImage, PreprocessFailure, ProcessingOutcome, preprocess, preprocess_batch};
