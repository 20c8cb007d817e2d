//! OCRエンジンの抽象化。
//!
//! The trimming pipeline only needs two capabilities: word-level bounding
//! boxes for the box-based trimmer, and plain text for orientation scoring.
//! Both are behind [`OcrEngine`] so tests can substitute a stub and so an
//! environment without Tesseract degrades instead of failing.

pub mod tesseract;

pub use tesseract::TesseractEngine;

use crate::error::Result;

/// One detected word with its bounding box in image coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub text: String,
    /// Recognition confidence, 0.0 to 100.0. Negative means "no estimate".
    pub confidence: f32,
}

/// Text detection backend.
pub trait OcrEngine: Send + Sync {
    /// Whether the backend can run at all in this environment.
    fn is_available(&self) -> bool;

    /// Recognize plain text from a grayscale/binary image.
    fn extract_text(
        &self,
        img: &image::GrayImage,
        lang: &str,
        config: &str,
        timeout_secs: u64,
    ) -> Result<String>;

    /// Detect word-level bounding boxes.
    fn detect_boxes(
        &self,
        img: &image::DynamicImage,
        lang: &str,
        config: &str,
        timeout_secs: u64,
    ) -> Result<Vec<TextBox>>;
}

/// Engine that reports itself unavailable. Used where OCR is intentionally
/// disabled; every OCR-dependent stage then takes its fallback path.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOcrEngine;

impl OcrEngine for NullOcrEngine {
    fn is_available(&self) -> bool {
        false
    }

    fn extract_text(
        &self,
        _img: &image::GrayImage,
        _lang: &str,
        _config: &str,
        _timeout_secs: u64,
    ) -> Result<String> {
        Err(crate::error::PrepError::ocr("OCR engine is disabled"))
    }

    fn detect_boxes(
        &self,
        _img: &image::DynamicImage,
        _lang: &str,
        _config: &str,
        _timeout_secs: u64,
    ) -> Result<Vec<TextBox>> {
        Err(crate::error::PrepError::ocr("OCR engine is disabled"))
    }
}
