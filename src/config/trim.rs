use std::str::FromStr;

use serde::Deserialize;

/// 偶数なら+1して奇数に、最小値未満なら最小値に揃える。
///
/// OpenCV由来の制約: 適応的閾値のブロックサイズは奇数かつ3以上、
/// モルフォロジーのカーネルサイズは奇数かつ1以上でなければならない。
pub fn normalize_odd(value: u32, min: u32) -> u32 {
    let v = value.max(min);
    if v % 2 == 0 { v + 1 } else { v }
}

/// Strategy for choosing between the contour-based and OCR-box-based
/// trimming results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrimStrategy {
    OcrThenContour,
    ContourThenOcr,
    OcrOnly,
    ContourOnly,
    None,
}

impl TrimStrategy {
    /// Parse a strategy name, falling back to `ocr_then_contour` for unknown
    /// strings (with a logged warning) so a typo in an override never fails
    /// the pipeline.
    pub fn parse_lossy(s: &str) -> Self {
        match Self::from_str(s) {
            Ok(strategy) => strategy,
            Err(_) => {
                tracing::warn!(strategy = s, "unknown trimming strategy, using ocr_then_contour");
                TrimStrategy::OcrThenContour
            }
        }
    }
}

impl FromStr for TrimStrategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ocr_then_contour" => Ok(TrimStrategy::OcrThenContour),
            "contour_then_ocr" => Ok(TrimStrategy::ContourThenOcr),
            "ocr_only" => Ok(TrimStrategy::OcrOnly),
            "contour_only" => Ok(TrimStrategy::ContourOnly),
            "none" => Ok(TrimStrategy::None),
            _ => Err(()),
        }
    }
}

/// Parameters for the OCR-box-based trimmer (a sub-record of [`TrimParams`]).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OcrTrimParams {
    /// Padding added around the union of accepted boxes, in pixels.
    pub padding: u32,
    /// Tesseract language list, e.g. "eng+jpn".
    pub lang: String,
    /// Minimum word confidence (0-100) for a box to count.
    pub min_confidence: f32,
    /// Absolute pixel floors; boxes smaller than this are noise specks.
    pub min_box_width: u32,
    pub min_box_height: u32,
    /// Ratio ceilings relative to the image; boxes larger than this are
    /// spurious whole-page detections.
    pub max_box_width_ratio: f64,
    pub max_box_height_ratio: f64,
    /// Accepted width/height aspect-ratio range; rejects degenerate slivers.
    pub min_aspect_ratio: f64,
    pub max_aspect_ratio: f64,
    /// Extra engine options, e.g. "--psm 6".
    pub tesseract_config: String,
    /// Subprocess timeout for box detection, in seconds.
    pub detect_timeout_secs: u64,
    /// Subprocess timeout per angle for orientation text extraction, in seconds.
    pub text_timeout_secs: u64,
}

impl Default for OcrTrimParams {
    fn default() -> Self {
        OcrTrimParams {
            padding: 0,
            lang: "eng+jpn".to_string(),
            min_confidence: 25.0,
            min_box_width: 5,
            min_box_height: 5,
            max_box_width_ratio: 0.8,
            max_box_height_ratio: 0.3,
            min_aspect_ratio: 0.05,
            max_aspect_ratio: 20.0,
            tesseract_config: "--psm 6".to_string(),
            detect_timeout_secs: 15,
            text_timeout_secs: 5,
        }
    }
}

/// Parameters for the binarization + contour trimming pipeline.
///
/// Immutable for the duration of one `preprocess` call. Block and kernel
/// sizes are normalized to odd values via the accessor methods before use.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrimParams {
    /// Whether contour-based trimming runs at all.
    pub apply: bool,
    /// Padding added around the union bounding box, in pixels.
    pub padding: u32,
    /// Adaptive threshold block size (normalized to odd >= 3).
    pub adaptive_thresh_block_size: u32,
    /// Adaptive threshold C constant, subtracted from the local mean.
    pub adaptive_thresh_c: i32,
    /// Components below `width * height * ratio` pixels are discarded.
    pub min_contour_area_ratio: f64,
    /// Gaussian blur kernel (width, height); (0, 0) disables the blur.
    pub gaussian_blur_kernel: (u32, u32),
    pub morph_open_apply: bool,
    pub morph_open_kernel_size: u32,
    pub morph_open_iterations: u32,
    pub morph_close_apply: bool,
    pub morph_close_kernel_size: u32,
    pub morph_close_iterations: u32,
    /// OCR-trim sub-parameters.
    pub ocr: OcrTrimParams,
}

impl Default for TrimParams {
    fn default() -> Self {
        TrimParams {
            apply: true,
            padding: 0,
            adaptive_thresh_block_size: 11,
            adaptive_thresh_c: 7,
            min_contour_area_ratio: 0.00005,
            gaussian_blur_kernel: (0, 0),
            morph_open_apply: false,
            morph_open_kernel_size: 3,
            morph_open_iterations: 1,
            morph_close_apply: false,
            morph_close_kernel_size: 3,
            morph_close_iterations: 1,
            ocr: OcrTrimParams::default(),
        }
    }
}

impl TrimParams {
    /// Adaptive threshold block size, normalized to an odd value >= 3.
    pub fn block_size(&self) -> u32 {
        normalize_odd(self.adaptive_thresh_block_size, 3)
    }

    /// Morphological open kernel size, normalized to an odd value >= 1.
    pub fn open_kernel(&self) -> u32 {
        normalize_odd(self.morph_open_kernel_size, 1)
    }

    /// Morphological close kernel size, normalized to an odd value >= 1.
    pub fn close_kernel(&self) -> u32 {
        normalize_odd(self.morph_close_kernel_size, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_odd_bumps_even_values() {
        assert_eq!(normalize_odd(10, 3), 11);
        assert_eq!(normalize_odd(11, 3), 11);
        assert_eq!(normalize_odd(0, 3), 3);
        assert_eq!(normalize_odd(2, 1), 3);
        assert_eq!(normalize_odd(1, 1), 1);
    }

    #[test]
    fn strategy_parse_known_names() {
        assert_eq!(
            TrimStrategy::from_str("contour_only"),
            Ok(TrimStrategy::ContourOnly)
        );
        assert_eq!(TrimStrategy::from_str("none"), Ok(TrimStrategy::None));
        assert!(TrimStrategy::from_str("both_at_once").is_err());
    }

    #[test]
    fn strategy_parse_lossy_falls_back() {
        assert_eq!(
            TrimStrategy::parse_lossy("both_at_once"),
            TrimStrategy::OcrThenContour
        );
    }

    #[test]
    fn trim_params_defaults_are_normalized() {
        let params = TrimParams::default();
        assert_eq!(params.block_size(), 11);
        assert_eq!(params.open_kernel(), 3);
        assert!(params.apply);
    }
}
