//! Tesseract CLIバックエンド (rusty-tesseract経由)。

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use image::DynamicImage;
use rusty_tesseract::{Args, Image};
use tracing::{debug, warn};

use super::{OcrEngine, TextBox};
use crate::error::{PrepError, Result};

/// Word-level entries in Tesseract TSV output.
const TSV_WORD_LEVEL: i32 = 5;

/// OCR backend driving the `tesseract` command line tool.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    available: bool,
}

impl TesseractEngine {
    /// Probe for a usable `tesseract` binary. When the probe fails the
    /// engine stays constructible but reports itself unavailable, and the
    /// pipeline skips OCR-dependent stages.
    pub fn new() -> Self {
        let available = match rusty_tesseract::get_tesseract_version() {
            Ok(version) => {
                debug!(version = version.trim(), "tesseract detected");
                true
            }
            Err(e) => {
                warn!("tesseract not available, OCR stages will be skipped: {e}");
                false
            }
        };
        TesseractEngine { available }
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Build rusty-tesseract arguments from a language spec and a Tesseract
/// config string such as `"--psm 6"`. Unrecognized tokens are ignored.
fn build_args(lang: &str, config: &str) -> Args {
    let mut args = Args {
        lang: lang.to_string(),
        ..Args::default()
    };
    let mut tokens = config.split_whitespace();
    while let Some(token) = tokens.next() {
        match token {
            "--psm" => {
                if let Some(value) = tokens.next().and_then(|v| v.parse().ok()) {
                    args.psm = Some(value);
                }
            }
            "--oem" => {
                if let Some(value) = tokens.next().and_then(|v| v.parse().ok()) {
                    args.oem = Some(value);
                }
            }
            "--dpi" => {
                if let Some(value) = tokens.next().and_then(|v| v.parse().ok()) {
                    args.dpi = Some(value);
                }
            }
            other => {
                if !other.is_empty() {
                    warn!(token = other, "ignoring unsupported tesseract config token");
                }
            }
        }
    }
    args
}

/// Run a Tesseract invocation on a worker thread with a deadline.
///
/// Tesseract occasionally hangs on degraded input. The subprocess cannot be
/// interrupted from here, so on timeout the worker thread is abandoned and
/// the stage reports an error to its caller.
fn run_with_timeout<T, F>(label: &str, timeout_secs: u64, job: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(job());
    });
    match rx.recv_timeout(Duration::from_secs(timeout_secs)) {
        Ok(result) => result,
        Err(_) => Err(PrepError::ocr(format!(
            "{label} timed out after {timeout_secs}s"
        ))),
    }
}

impl OcrEngine for TesseractEngine {
    fn is_available(&self) -> bool {
        self.available
    }

    fn extract_text(
        &self,
        img: &image::GrayImage,
        lang: &str,
        config: &str,
        timeout_secs: u64,
    ) -> Result<String> {
        if !self.available {
            return Err(PrepError::ocr("tesseract is not available"));
        }
        let dynamic = DynamicImage::ImageLuma8(img.clone());
        let args = build_args(lang, config);
        run_with_timeout("text extraction", timeout_secs, move || {
            let image = Image::from_dynamic_image(&dynamic)
                .map_err(|e| PrepError::ocr(format!("failed to prepare OCR input: {e}")))?;
            rusty_tesseract::image_to_string(&image, &args)
                .map_err(|e| PrepError::ocr(format!("tesseract text extraction failed: {e}")))
        })
    }

    fn detect_boxes(
        &self,
        img: &DynamicImage,
        lang: &str,
        config: &str,
        timeout_secs: u64,
    ) -> Result<Vec<TextBox>> {
        if !self.available {
            return Err(PrepError::ocr("tesseract is not available"));
        }
        let dynamic = img.clone();
        let args = build_args(lang, config);
        run_with_timeout("box detection", timeout_secs, move || {
            let image = Image::from_dynamic_image(&dynamic)
                .map_err(|e| PrepError::ocr(format!("failed to prepare OCR input: {e}")))?;
            let output = rusty_tesseract::image_to_data(&image, &args)
                .map_err(|e| PrepError::ocr(format!("tesseract box detection failed: {e}")))?;

            let boxes = output
                .data
                .into_iter()
                .filter(|d| d.level == TSV_WORD_LEVEL && d.width > 0 && d.height > 0)
                .map(|d| TextBox {
                    x: d.left,
                    y: d.top,
                    width: d.width as u32,
                    height: d.height as u32,
                    text: d.text,
                    confidence: d.conf,
                })
                .collect();
            Ok(boxes)
        })
    }
}
