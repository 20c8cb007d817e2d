//! テキスト領域トリミングの共通部品と結果型。

pub mod contour;
pub mod ocr_bounds;
pub mod strategy;

use image::{DynamicImage, GrayImage};

/// An axis-aligned candidate region with an area or confidence measure.
/// Produced transiently by either trimmer and consumed into a union box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
    /// Component pixel area for contours, confidence for OCR boxes.
    pub measure: f64,
}

/// Final crop rectangle in image coordinates, guaranteed in-bounds and
/// non-degenerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Companion image for the OCR branch, pixel-aligned with the main crop.
/// Only the contour strategy produces one.
#[derive(Debug, Clone)]
pub enum CompanionImage {
    /// Crop of the binarized intermediate.
    Binarized(GrayImage),
    /// Grayscale crop, used when the binary crop contained no foreground.
    Grayscale(GrayImage),
}

impl CompanionImage {
    pub fn image(&self) -> &GrayImage {
        match self {
            CompanionImage::Binarized(img) | CompanionImage::Grayscale(img) => img,
        }
    }
}

/// One trimming strategy's output.
#[derive(Debug, Clone)]
pub struct TrimResult {
    /// Crop from the original (non-binarized) oriented image.
    pub main: DynamicImage,
    /// Same pixel region from the binarized (or fallback grayscale)
    /// intermediate.
    pub companion: Option<CompanionImage>,
}

/// Why a trimmer produced no result. Never fatal; callers fall back to the
/// unmodified oriented image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrimSkip {
    /// No qualifying regions survived filtering.
    NoRegions,
    /// The padded crop rectangle collapsed to zero size.
    Degenerate,
    /// The OCR engine is not available in this environment.
    EngineUnavailable,
    /// An internal stage failed; the message is for logging only.
    StageFailed(String),
}

/// Smallest rectangle containing every region in full. The union is taken
/// over edges (min left/top, max right/bottom), never over centroids, so no
/// accepted pixel is ever cropped out.
pub fn union_bounds(regions: &[Region]) -> Option<(i64, i64, i64, i64)> {
    let first = regions.first()?;
    let mut left = first.x;
    let mut top = first.y;
    let mut right = first.x + first.width;
    let mut bottom = first.y + first.height;
    for r in &regions[1..] {
        left = left.min(r.x);
        top = top.min(r.y);
        right = right.max(r.x + r.width);
        bottom = bottom.max(r.y + r.height);
    }
    Some((left, top, right, bottom))
}

/// Expand a union box by `padding` on all sides and clamp it to the image.
/// Returns None if the clamped rectangle is degenerate.
pub fn pad_and_clamp(
    bounds: (i64, i64, i64, i64),
    padding: u32,
    image_width: u32,
    image_height: u32,
) -> Option<CropRect> {
    let (left, top, right, bottom) = bounds;
    let pad = padding as i64;
    let x0 = (left - pad).max(0);
    let y0 = (top - pad).max(0);
    let x1 = (right + pad).min(image_width as i64);
    let y1 = (bottom + pad).min(image_height as i64);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(CropRect {
        x: x0 as u32,
        y: y0 as u32,
        width: (x1 - x0) as u32,
        height: (y1 - y0) as u32,
    })
}
