// 前処理パイプラインのエンドツーエンドテスト

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, Rgb, RgbImage};

use worksheet_prep::config::merged::PreprocessOverrides;
use worksheet_prep::config::settings::Settings;
use worksheet_prep::config::trim::TrimParams;
use worksheet_prep::error::{PrepError, Result};
use worksheet_prep::ocr::{NullOcrEngine, OcrEngine, TextBox};
use worksheet_prep::pipeline::batch::{BatchInput, preprocess_batch};
use worksheet_prep::pipeline::preprocessor::preprocess;

/// Worksheet-like page: white with horizontal text bands in the central
/// 60% of the frame.
fn worksheet_page(width: u32, height: u32) -> DynamicImage {
    let mut img = RgbImage::from_pixel(width, height, Rgb([245, 245, 245]));
    let x0 = width / 5;
    let x1 = width * 4 / 5;
    let mut y = height / 5;
    while y + 3 < height * 4 / 5 {
        for x in x0..x1 {
            img.put_pixel(x, y, Rgb([20, 20, 20]));
            img.put_pixel(x, y + 1, Rgb([20, 20, 20]));
            img.put_pixel(x, y + 2, Rgb([20, 20, 20]));
        }
        y += height / 12;
    }
    DynamicImage::ImageRgb8(img)
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format).expect("encode fixture");
    bytes
}

fn decoded_dims(bytes: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory(bytes).expect("decode output");
    (img.width(), img.height())
}

// ============================================================
// 1. 輪郭トリミングでの切り出し
// ============================================================

#[test]
fn test_contour_only_crops_to_the_text_block() {
    let page = worksheet_page(800, 600);
    let bytes = encode(&page, ImageFormat::Jpeg);

    let settings = Settings::default();
    let mut trim_params = TrimParams::default();
    trim_params.min_contour_area_ratio = 0.0005;
    let overrides = PreprocessOverrides {
        trimming_strategy: Some("contour_only".to_string()),
        trim_params: Some(trim_params),
        ..Default::default()
    };

    let outcome = preprocess(&NullOcrEngine, &settings, &bytes, "image/jpeg", &overrides)
        .expect("should succeed");

    let (w, h) = decoded_dims(&outcome.display_image.bytes);
    assert!(w < 800 && h < 600, "display image must be cropped, got {w}x{h}");
    // テキスト帯は中央60%に収まる
    assert!(w >= 800 * 3 / 5 - 10 && w <= 800 * 3 / 5 + 30);
    assert!(
        outcome.ocr_source_description.contains("輪郭"),
        "description was {:?}",
        outcome.ocr_source_description
    );
    assert!(outcome.ocr_input_image.is_some());
    assert_eq!(outcome.ocr_input_image.as_ref().unwrap().mime, "image/png");
    assert!(outcome.contour_crop.is_some());
    assert!(outcome.ocr_crop.is_none(), "OCR trimmer never ran");
    assert!(!outcome.debug_frames.is_empty());
}

#[test]
fn test_ocr_binary_crop_matches_display_source_dimensions() {
    let page = worksheet_page(400, 300);
    let bytes = encode(&page, ImageFormat::Png);
    let overrides = PreprocessOverrides {
        trimming_strategy: Some("contour_only".to_string()),
        ..Default::default()
    };
    let outcome = preprocess(&NullOcrEngine, &Settings::default(), &bytes, "image/png", &overrides)
        .expect("should succeed");

    let crop = image::load_from_memory(outcome.contour_crop.as_ref().unwrap()).expect("crop");
    let ocr = image::load_from_memory(&outcome.ocr_input_image.as_ref().unwrap().bytes)
        .expect("ocr image");
    assert_eq!((ocr.width(), ocr.height()), (crop.width(), crop.height()));
}

// ============================================================
// 2. 戦略 none / 向き補正のみ
// ============================================================

#[test]
fn test_none_strategy_keeps_oriented_dimensions() {
    let page = worksheet_page(800, 600);
    let bytes = encode(&page, ImageFormat::Jpeg);
    let overrides = PreprocessOverrides {
        trimming_strategy: Some("none".to_string()),
        ..Default::default()
    };
    let outcome = preprocess(&NullOcrEngine, &Settings::default(), &bytes, "image/jpeg", &overrides)
        .expect("should succeed");

    assert_eq!(decoded_dims(&outcome.display_image.bytes), (800, 600));
    assert_eq!(outcome.display_image.mime, "image/jpeg");
    assert!(outcome.ocr_source_description.contains("向き補正後の画像"));
}

#[test]
fn test_finishing_branches_record_each_transformation() {
    // 予算超過 + グレースケール有効の実行では、仕上げ2系統の
    // 中間画像がそれぞれデバッグフレームとして残ること
    let page = worksheet_page(400, 300);
    let bytes = encode(&page, ImageFormat::Png);
    let overrides = PreprocessOverrides {
        trimming_strategy: Some("none".to_string()),
        max_pixels: Some(30_000),
        ..Default::default()
    };
    let outcome = preprocess(&NullOcrEngine, &Settings::default(), &bytes, "image/png", &overrides)
        .expect("should succeed");

    let labels: Vec<&str> = outcome
        .debug_frames
        .iter()
        .map(|f| f.label.as_str())
        .collect();
    assert!(labels.contains(&"Display/Vision - Grayscale"), "labels: {labels:?}");
    assert!(labels.contains(&"Display/Vision - Resized"), "labels: {labels:?}");
    assert!(labels.contains(&"OCR - Resized"), "labels: {labels:?}");
    // 予算内に収まったことも確認
    let (w, h) = decoded_dims(&outcome.display_image.bytes);
    assert!(w as u64 * h as u64 <= 30_000);
}

#[test]
fn test_within_budget_run_skips_resize_frames() {
    let page = worksheet_page(200, 150);
    let bytes = encode(&page, ImageFormat::Png);
    let overrides = PreprocessOverrides {
        trimming_strategy: Some("none".to_string()),
        ..Default::default()
    };
    let outcome = preprocess(&NullOcrEngine, &Settings::default(), &bytes, "image/png", &overrides)
        .expect("should succeed");

    assert!(
        !outcome.debug_frames.iter().any(|f| f.label.ends_with("Resized")),
        "no resize happened, so no resize frame should be recorded"
    );
}

// ============================================================
// 3. MIME処理
// ============================================================

#[test]
fn test_gif_input_is_converted_to_png() {
    let page = worksheet_page(120, 90);
    let bytes = encode(&page, ImageFormat::Gif);
    let outcome = preprocess(
        &NullOcrEngine,
        &Settings::default(),
        &bytes,
        "image/gif",
        &PreprocessOverrides::default(),
    )
    .expect("should succeed");

    assert_eq!(outcome.display_image.mime, "image/png");
    assert_eq!(
        image::guess_format(&outcome.display_image.bytes).unwrap(),
        ImageFormat::Png
    );
}

#[test]
fn test_unsupported_mime_fails_without_debug_frames() {
    let failure = preprocess(
        &NullOcrEngine,
        &Settings::default(),
        b"not an image",
        "image/tiff",
        &PreprocessOverrides::default(),
    )
    .expect_err("should fail");

    assert!(matches!(failure.error, PrepError::UnsupportedFormat(_)));
    assert!(failure.debug_frames.is_empty());
}

#[test]
fn test_decode_ceiling_rejects_oversized_images() {
    let page = worksheet_page(200, 200);
    let bytes = encode(&page, ImageFormat::Png);
    let mut settings = Settings::default();
    settings.max_decode_pixels = 10_000;

    let failure = preprocess(
        &NullOcrEngine,
        &settings,
        &bytes,
        "image/png",
        &PreprocessOverrides::default(),
    )
    .expect_err("should fail");
    assert!(matches!(failure.error, PrepError::DecodeError(_)));
}

#[test]
fn test_garbage_bytes_fail_to_decode() {
    let failure = preprocess(
        &NullOcrEngine,
        &Settings::default(),
        b"\x00\x01\x02\x03",
        "image/png",
        &PreprocessOverrides::default(),
    )
    .expect_err("should fail");
    assert!(matches!(failure.error, PrepError::DecodeError(_)));
}

// ============================================================
// 4. OCRエンジン利用不可時の縮退
// ============================================================

#[test]
fn test_ocr_only_without_engine_falls_back_to_oriented_image() {
    let page = worksheet_page(300, 200);
    let bytes = encode(&page, ImageFormat::Jpeg);
    let overrides = PreprocessOverrides {
        trimming_strategy: Some("ocr_only".to_string()),
        ..Default::default()
    };
    let outcome = preprocess(&NullOcrEngine, &Settings::default(), &bytes, "image/jpeg", &overrides)
        .expect("engine unavailability must not be fatal");

    assert_eq!(decoded_dims(&outcome.display_image.bytes), (300, 200));
    assert!(outcome.ocr_source_description.contains("向き補正後の画像"));
    assert!(outcome.ocr_crop.is_none());
}

// ============================================================
// 5. スタブエンジンでのOCRトリミング
// ============================================================

/// Stub engine with fixed detection boxes and no text.
struct FixedBoxes(Vec<TextBox>);

impl OcrEngine for FixedBoxes {
    fn is_available(&self) -> bool {
        true
    }

    fn extract_text(
        &self,
        _img: &GrayImage,
        _lang: &str,
        _config: &str,
        _timeout_secs: u64,
    ) -> Result<String> {
        Ok(String::new())
    }

    fn detect_boxes(
        &self,
        _img: &DynamicImage,
        _lang: &str,
        _config: &str,
        _timeout_secs: u64,
    ) -> Result<Vec<TextBox>> {
        Ok(self.0.clone())
    }
}

#[test]
fn test_ocr_only_with_boxes_crops_and_binarizes_fresh() {
    let page = worksheet_page(400, 300);
    let bytes = encode(&page, ImageFormat::Png);
    let engine = FixedBoxes(vec![
        TextBox {
            x: 80,
            y: 60,
            width: 200,
            height: 30,
            text: "問題".to_string(),
            confidence: 90.0,
        },
        TextBox {
            x: 80,
            y: 120,
            width: 180,
            height: 30,
            text: "answer".to_string(),
            confidence: 88.0,
        },
    ]);
    let overrides = PreprocessOverrides {
        trimming_strategy: Some("ocr_only".to_string()),
        ..Default::default()
    };
    let outcome = preprocess(&engine, &Settings::default(), &bytes, "image/png", &overrides)
        .expect("should succeed");

    // 和集合 (80,60)-(280,150)
    assert_eq!(decoded_dims(&outcome.display_image.bytes), (200, 90));
    assert!(outcome.ocr_source_description.contains("OCRトリミング後の画像"));
    assert!(outcome.ocr_source_description.contains("二値化"));
    assert!(outcome.ocr_crop.is_some());
    assert!(outcome.contour_crop.is_none());
}

// ============================================================
// 6. バッチ処理
// ============================================================

#[test]
fn test_batch_preserves_input_order() {
    let inputs = vec![
        BatchInput {
            bytes: encode(&worksheet_page(300, 200), ImageFormat::Png),
            mime_type: "image/png".to_string(),
        },
        BatchInput {
            bytes: encode(&worksheet_page(200, 300), ImageFormat::Png),
            mime_type: "image/png".to_string(),
        },
    ];
    let overrides = PreprocessOverrides {
        trimming_strategy: Some("none".to_string()),
        ..Default::default()
    };
    let results = preprocess_batch(&NullOcrEngine, &Settings::default(), &inputs, &overrides);

    assert_eq!(results.len(), 2);
    let first = results[0].as_ref().expect("first image");
    let second = results[1].as_ref().expect("second image");
    assert_eq!(decoded_dims(&first.display_image.bytes), (300, 200));
    assert_eq!(decoded_dims(&second.display_image.bytes), (200, 300));
    assert!(!first.debug_frames.is_empty());
    assert!(!second.debug_frames.is_empty());
}
