//! 向き補正: EXIFタグ + 投影プロファイル + OCR文字数による回転推定。
//!
//! Every stage is independently skippable. A failed EXIF read, a failed
//! estimator, or an unavailable OCR engine degrades to "no correction from
//! that stage" with a warning; this module never fails the pipeline.

use std::io::Cursor;

use exif::{In, Tag};
use image::{DynamicImage, GrayImage};
use tracing::{debug, warn};

use crate::config::trim::TrimParams;
use crate::ocr::OcrEngine;
use crate::ops::binarize::{adaptive_threshold, to_gray};

/// Candidate rotations, counter-clockwise degrees. Order matters: ties in
/// estimator scores resolve to the earlier angle, so 0 wins over everything.
const CANDIDATE_ANGLES: [u32; 4] = [0, 90, 180, 270];

/// What the corrector did, for logging and debug-frame gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrientationReport {
    /// EXIF orientation value that was applied (None if absent, unreadable,
    /// or the identity value 1).
    pub exif_orientation: Option<u16>,
    /// Heuristic rotation applied after EXIF, counter-clockwise degrees.
    pub rotation: u32,
}

impl OrientationReport {
    pub fn changed(&self) -> bool {
        self.exif_orientation.is_some() || self.rotation != 0
    }
}

/// Read the EXIF orientation tag from the original encoded bytes.
pub fn read_exif_orientation(bytes: &[u8]) -> Option<u16> {
    let mut cursor = Cursor::new(bytes);
    let reader = exif::Reader::new();
    let data = reader.read_from_container(&mut cursor).ok()?;
    let field = data.get_field(Tag::Orientation, In::PRIMARY)?;
    field.value.get_uint(0).map(|v| v as u16)
}

/// Apply one of the 8 standard EXIF orientation transforms.
/// Value 1 and unknown values are the identity.
pub fn apply_exif_orientation(img: &DynamicImage, orientation: u16) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img.clone(),
    }
}

/// Rotate counter-clockwise by a multiple of 90 degrees.
///
/// `DynamicImage::rotate90` is clockwise, hence the mirrored mapping.
pub fn rotate_ccw(img: &DynamicImage, degrees: u32) -> DynamicImage {
    match degrees % 360 {
        90 => img.rotate270(),
        180 => img.rotate180(),
        270 => img.rotate90(),
        _ => img.clone(),
    }
}

/// Variance of the row-wise foreground sums of an inverted binary image.
///
/// Horizontal text lines produce alternating dense and empty rows, so a
/// correctly oriented page scores high and a sideways page scores low.
pub fn projection_score(binary: &GrayImage) -> f64 {
    let (width, height) = binary.dimensions();
    if height == 0 || width == 0 {
        return 0.0;
    }
    let mut row_sums = Vec::with_capacity(height as usize);
    for y in 0..height {
        let mut sum = 0u64;
        for x in 0..width {
            if binary.get_pixel(x, y).0[0] > 0 {
                sum += 1;
            }
        }
        row_sums.push(sum as f64);
    }
    let mean = row_sums.iter().sum::<f64>() / row_sums.len() as f64;
    row_sums.iter().map(|s| (s - mean) * (s - mean)).sum::<f64>() / row_sums.len() as f64
}

/// Estimate the best rotation by maximizing the projection score over the
/// four candidate angles. Strictly-greater comparison keeps 0 on ties.
pub fn estimate_rotation_by_projection(img: &DynamicImage, params: &TrimParams) -> u32 {
    let gray = to_gray(img);
    let binary = adaptive_threshold(&gray, params.block_size(), params.adaptive_thresh_c);

    let mut best_angle = 0;
    let mut best_score = f64::MIN;
    for angle in CANDIDATE_ANGLES {
        let rotated = rotate_ccw(&DynamicImage::ImageLuma8(binary.clone()), angle).to_luma8();
        let score = projection_score(&rotated);
        debug!(angle, score, "projection score");
        if score > best_score {
            best_score = score;
            best_angle = angle;
        }
    }
    best_angle
}

/// Estimate the best rotation by running text extraction at each angle and
/// counting recognized non-whitespace characters. Returns 0 when the engine
/// is unavailable or every angle fails or yields nothing.
pub fn estimate_rotation_by_ocr(
    engine: &dyn OcrEngine,
    img: &DynamicImage,
    params: &TrimParams,
) -> u32 {
    if !engine.is_available() {
        debug!("OCR engine unavailable, skipping OCR orientation estimate");
        return 0;
    }
    let gray = to_gray(img);
    let binary = adaptive_threshold(&gray, params.block_size(), params.adaptive_thresh_c);

    let mut best_angle = 0;
    let mut best_count = 0usize;
    for angle in CANDIDATE_ANGLES {
        let rotated = rotate_ccw(&DynamicImage::ImageLuma8(binary.clone()), angle).to_luma8();
        let count = match engine.extract_text(
            &rotated,
            &params.ocr.lang,
            &params.ocr.tesseract_config,
            params.ocr.text_timeout_secs,
        ) {
            Ok(text) => text.chars().filter(|c| !c.is_whitespace()).count(),
            Err(e) => {
                warn!(angle, "OCR orientation probe failed: {e}");
                continue;
            }
        };
        debug!(angle, count, "OCR character count");
        if count > best_count {
            best_count = count;
            best_angle = angle;
        }
    }
    best_angle
}

/// Full orientation correction: EXIF transform, then at most one heuristic
/// 90-degree-multiple rotation chosen by arbitrating the two estimators.
///
/// Arbitration: agreement applies the shared angle; disagreement prefers the
/// projection estimate; a single non-zero estimate wins alone; both zero
/// means no rotation.
pub fn correct_orientation(
    engine: &dyn OcrEngine,
    img: &DynamicImage,
    original_bytes: &[u8],
    params: &TrimParams,
) -> (DynamicImage, OrientationReport) {
    let exif_orientation = read_exif_orientation(original_bytes).filter(|&v| (2..=8).contains(&v));
    let oriented = match exif_orientation {
        Some(value) => {
            debug!(value, "applying EXIF orientation");
            apply_exif_orientation(img, value)
        }
        None => img.clone(),
    };

    let projection = estimate_rotation_by_projection(&oriented, params);
    let ocr = estimate_rotation_by_ocr(engine, &oriented, params);

    let rotation = match (projection, ocr) {
        (0, 0) => 0,
        (p, 0) => p,
        (0, o) => o,
        (p, o) if p == o => p,
        (p, o) => {
            // 不一致時は投影プロファイルを優先する (チューニング対象)。
            debug!(projection = p, ocr = o, "rotation estimators disagree, using projection");
            p
        }
    };

    let corrected = if rotation != 0 {
        debug!(rotation, "applying heuristic rotation");
        rotate_ccw(&oriented, rotation)
    } else {
        oriented
    };

    (
        corrected,
        OrientationReport {
            exif_orientation,
            rotation,
        },
    )
}
