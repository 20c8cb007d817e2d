// 戦略アービターのテスト

use image::{DynamicImage, GrayImage, RgbImage};

use worksheet_prep::config::trim::TrimStrategy;
use worksheet_prep::trim::strategy::{SelectionSource, select_trim_result};
use worksheet_prep::trim::{CompanionImage, TrimResult};

fn oriented() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::new(100, 100))
}

fn contour() -> Option<TrimResult> {
    Some(TrimResult {
        main: DynamicImage::ImageRgb8(RgbImage::new(40, 40)),
        companion: Some(CompanionImage::Binarized(GrayImage::new(40, 40))),
    })
}

fn ocr() -> Option<TrimResult> {
    Some(TrimResult {
        main: DynamicImage::ImageRgb8(RgbImage::new(60, 20)),
        companion: None,
    })
}

// ============================================================
// 1. 解決表の各行
// ============================================================

#[test]
fn test_ocr_then_contour_rows() {
    let s = select_trim_result(contour(), ocr(), TrimStrategy::OcrThenContour, &oriented());
    assert_eq!(s.source, SelectionSource::OcrTrim);
    assert!(s.companion.is_none());

    let s = select_trim_result(contour(), None, TrimStrategy::OcrThenContour, &oriented());
    assert_eq!(s.source, SelectionSource::ContourTrim);
    assert!(s.companion.is_some());

    let s = select_trim_result(None, None, TrimStrategy::OcrThenContour, &oriented());
    assert_eq!(s.source, SelectionSource::Oriented);
}

#[test]
fn test_contour_then_ocr_rows() {
    let s = select_trim_result(contour(), ocr(), TrimStrategy::ContourThenOcr, &oriented());
    assert_eq!(s.source, SelectionSource::ContourTrim);

    let s = select_trim_result(None, ocr(), TrimStrategy::ContourThenOcr, &oriented());
    assert_eq!(s.source, SelectionSource::OcrTrim);

    let s = select_trim_result(None, None, TrimStrategy::ContourThenOcr, &oriented());
    assert_eq!(s.source, SelectionSource::Oriented);
}

#[test]
fn test_exclusive_strategies_ignore_the_other_result() {
    let s = select_trim_result(contour(), None, TrimStrategy::OcrOnly, &oriented());
    assert_eq!(s.source, SelectionSource::Oriented, "ocr_only never uses the contour result");

    let s = select_trim_result(None, ocr(), TrimStrategy::ContourOnly, &oriented());
    assert_eq!(s.source, SelectionSource::Oriented, "contour_only never uses the OCR result");

    let s = select_trim_result(contour(), ocr(), TrimStrategy::ContourOnly, &oriented());
    assert_eq!(s.source, SelectionSource::ContourTrim);
}

#[test]
fn test_none_strategy_always_uses_oriented_image() {
    let s = select_trim_result(contour(), ocr(), TrimStrategy::None, &oriented());
    assert_eq!(s.source, SelectionSource::Oriented);
    assert_eq!((s.main.width(), s.main.height()), (100, 100));
}

// ============================================================
// 2. 全域性: どの組み合わせでも必ず画像が返る
// ============================================================

#[test]
fn test_arbiter_is_total() {
    let strategies = [
        TrimStrategy::OcrThenContour,
        TrimStrategy::ContourThenOcr,
        TrimStrategy::OcrOnly,
        TrimStrategy::ContourOnly,
        TrimStrategy::None,
    ];
    for strategy in strategies {
        for c in [None, contour()] {
            for o in [None, ocr()] {
                let s = select_trim_result(c.clone(), o.clone(), strategy, &oriented());
                assert!(
                    s.main.width() > 0 && s.main.height() > 0,
                    "{strategy:?} with contour={} ocr={} returned no image",
                    c.is_some(),
                    o.is_some()
                );
            }
        }
    }
}

// ============================================================
// 3. 不明な戦略名
// ============================================================

#[test]
fn test_unknown_strategy_string_falls_back() {
    assert_eq!(TrimStrategy::parse_lossy("aggressive"), TrimStrategy::OcrThenContour);
    assert_eq!(TrimStrategy::parse_lossy("contour_only"), TrimStrategy::ContourOnly);
}
