//! トリミング戦略のアービター。

use image::DynamicImage;
use tracing::debug;

use super::{CompanionImage, TrimResult};
use crate::config::trim::TrimStrategy;

/// Which trimmer's output ended up selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    OcrTrim,
    ContourTrim,
    Oriented,
}

impl SelectionSource {
    /// Human-readable description of the selected image, in the language of
    /// the application's logs.
    pub fn description(&self) -> &'static str {
        match self {
            SelectionSource::OcrTrim => "OCRトリミング後の画像",
            SelectionSource::ContourTrim => "輪郭トリミング後の画像",
            SelectionSource::Oriented => "向き補正後の画像",
        }
    }
}

/// The arbiter's choice: a main image, the contour strategy's companion
/// image when applicable, and where the image came from.
#[derive(Debug, Clone)]
pub struct Selection {
    pub main: DynamicImage,
    pub companion: Option<CompanionImage>,
    pub source: SelectionSource,
}

/// Pick the final trim result per the configured strategy.
///
/// Total over all inputs: when the preferred strategy produced nothing the
/// other is tried (for the two-step strategies), and when nothing remains
/// the unmodified oriented image is used. Never fails.
pub fn select_trim_result(
    contour: Option<TrimResult>,
    ocr: Option<TrimResult>,
    strategy: TrimStrategy,
    oriented: &DynamicImage,
) -> Selection {
    let from_ocr = |r: TrimResult| Selection {
        main: r.main,
        companion: None,
        source: SelectionSource::OcrTrim,
    };
    let from_contour = |r: TrimResult| Selection {
        main: r.main,
        companion: r.companion,
        source: SelectionSource::ContourTrim,
    };
    let fallback = || Selection {
        main: oriented.clone(),
        companion: None,
        source: SelectionSource::Oriented,
    };

    let selection = match strategy {
        TrimStrategy::OcrThenContour => match (ocr, contour) {
            (Some(o), _) => from_ocr(o),
            (None, Some(c)) => from_contour(c),
            (None, None) => fallback(),
        },
        TrimStrategy::ContourThenOcr => match (contour, ocr) {
            (Some(c), _) => from_contour(c),
            (None, Some(o)) => from_ocr(o),
            (None, None) => fallback(),
        },
        TrimStrategy::OcrOnly => match ocr {
            Some(o) => from_ocr(o),
            None => fallback(),
        },
        TrimStrategy::ContourOnly => match contour {
            Some(c) => from_contour(c),
            None => fallback(),
        },
        TrimStrategy::None => fallback(),
    };
    debug!(?strategy, source = ?selection.source, "trim result selected");
    selection
}
