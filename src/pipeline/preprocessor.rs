//! 前処理パイプライン本体。
//!
//! decode → 向き補正 → トリミング (戦略に応じて) → 仕上げの2系統
//! (表示/Vision向けと OCR向け) を1回の呼び出しで実行する。

use std::io::Cursor;

use image::{DynamicImage, ImageReader};
use tracing::{debug, info, warn};

use crate::config::merged::{MergedConfig, PreprocessOverrides};
use crate::config::settings::Settings;
use crate::config::trim::TrimStrategy;
use crate::debug_sink::{DebugFrame, DebugSink};
use crate::error::PrepError;
use crate::ocr::OcrEngine;
use crate::ops::binarize::{adaptive_threshold, to_gray};
use crate::ops::encode::{OutputFormat, encode_image};
use crate::ops::resize::resize_to_pixel_budget;
use crate::ops::{color_mode_name, flatten_onto_white};
use crate::orient::correct_orientation;
use crate::trim::CompanionImage;
use crate::trim::contour::trim_by_contours;
use crate::trim::ocr_bounds::trim_by_ocr_bounds;
use crate::trim::strategy::{Selection, select_trim_result};

/// Encoded output bytes plus their MIME type.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// Successful result of one `preprocess` call.
#[derive(Debug)]
pub struct ProcessingOutcome {
    /// Display/Vision-ready image.
    pub display_image: EncodedImage,
    /// OCR-ready image (PNG). None when the OCR branch degraded.
    pub ocr_input_image: Option<EncodedImage>,
    /// Per-strategy crop encodings for UI comparison.
    pub contour_crop: Option<Vec<u8>>,
    pub ocr_crop: Option<Vec<u8>>,
    pub debug_frames: Vec<DebugFrame>,
    /// Which strategy/source produced the OCR input, human-readable.
    pub ocr_source_description: String,
}

/// Fatal failure of one `preprocess` call. The debug frames accumulated up
/// to the failure point are preserved for diagnostics.
#[derive(Debug)]
pub struct PreprocessFailure {
    pub error: PrepError,
    pub debug_frames: Vec<DebugFrame>,
}

/// Run the full preprocessing pipeline over one uploaded image.
pub fn preprocess(
    engine: &dyn OcrEngine,
    settings: &Settings,
    bytes: &[u8],
    mime_type: &str,
    overrides: &PreprocessOverrides,
) -> Result<ProcessingOutcome, PreprocessFailure> {
    let config = MergedConfig::new(settings, overrides);

    let display_format = match resolve_display_format(settings, &config, mime_type) {
        Ok(format) => format,
        Err(error) => {
            return Err(PreprocessFailure {
                error,
                debug_frames: Vec::new(),
            });
        }
    };

    let mut sink = DebugSink::new(config.jpeg_quality);
    let img = match decode_guarded(bytes, settings.max_decode_pixels) {
        Ok(img) => img,
        Err(error) => {
            return Err(PreprocessFailure {
                error,
                debug_frames: sink.into_frames(),
            });
        }
    };
    sink.push("0. Initial Load", &img, OutputFormat::Png);

    // 向き補正 (EXIF + ヒューリスティック回転)
    let (oriented, report) = correct_orientation(engine, &img, bytes, &config.trim_params);
    if report.changed() {
        sink.push("1. Orientation Corrected", &oriented, OutputFormat::Png);
    }

    // 戦略に応じて各トリマーを実行
    let strategy = config.trimming_strategy;
    let run_contour = config.trim_params.apply
        && matches!(
            strategy,
            TrimStrategy::OcrThenContour | TrimStrategy::ContourThenOcr | TrimStrategy::ContourOnly
        );
    let run_ocr = matches!(
        strategy,
        TrimStrategy::OcrThenContour | TrimStrategy::ContourThenOcr | TrimStrategy::OcrOnly
    );

    let contour_result = if run_contour {
        match trim_by_contours(&oriented, &config.trim_params, &mut sink) {
            Ok(result) => Some(result),
            Err(skip) => {
                debug!(?skip, "contour trim produced no result");
                None
            }
        }
    } else {
        None
    };
    let ocr_result = if run_ocr {
        match trim_by_ocr_bounds(engine, &oriented, &config.trim_params.ocr, &mut sink) {
            Ok(result) => Some(result),
            Err(skip) => {
                debug!(?skip, "OCR trim produced no result");
                None
            }
        }
    } else {
        None
    };

    // 比較用にトリマーごとの切り出しを個別にエンコードしておく
    let contour_crop = contour_result
        .as_ref()
        .and_then(|r| encode_crop("contour", &r.main, display_format, config.jpeg_quality));
    let ocr_crop = ocr_result
        .as_ref()
        .and_then(|r| encode_crop("ocr", &r.main, display_format, config.jpeg_quality));

    let selection = select_trim_result(contour_result, ocr_result, strategy, &oriented);
    sink.push(
        format!("2. Selected: {}", selection.source.description()),
        &selection.main,
        OutputFormat::Png,
    );

    let display_image = match finish_display(&selection.main, &config, display_format, &mut sink) {
        Ok(image) => image,
        Err(error) => {
            return Err(PreprocessFailure {
                error,
                debug_frames: sink.into_frames(),
            });
        }
    };

    let (ocr_input_image, ocr_source_description) =
        finish_ocr_input(&selection, &config, &mut sink);

    info!(
        display_bytes = display_image.bytes.len(),
        ocr_image = ocr_input_image.is_some(),
        source = %ocr_source_description,
        "preprocessing finished"
    );

    Ok(ProcessingOutcome {
        display_image,
        ocr_input_image,
        contour_crop,
        ocr_crop,
        debug_frames: sink.into_frames(),
        ocr_source_description,
    })
}

/// Determine the display output format up front.
///
/// Convert-first MIME types encode to their mapping target; WebP input
/// encodes to PNG to keep any transparency; everything else uses the
/// configured output format. Unknown MIME types are a fatal error.
fn resolve_display_format(
    settings: &Settings,
    config: &MergedConfig,
    mime_type: &str,
) -> crate::error::Result<OutputFormat> {
    if let Some(target) = settings.convertable_mime_types.get(mime_type) {
        debug!(from = mime_type, to = %target, "convert-first input format");
        return Ok(OutputFormat::from_mime(target).unwrap_or(config.output_format));
    }
    if !settings.supported_mime_types.iter().any(|m| m == mime_type) {
        return Err(PrepError::unsupported_format(mime_type));
    }
    if mime_type == "image/webp" {
        return Ok(OutputFormat::Png);
    }
    Ok(config.output_format)
}

/// Decode with a declared-dimension check before the full decode, as a
/// decompression-bomb guard.
fn decode_guarded(bytes: &[u8], max_decode_pixels: u64) -> crate::error::Result<DynamicImage> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PrepError::decode(format!("cannot inspect image bytes: {e}")))?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| PrepError::decode(format!("cannot read image dimensions: {e}")))?;
    let declared = width as u64 * height as u64;
    if max_decode_pixels > 0 && declared > max_decode_pixels {
        return Err(PrepError::decode(format!(
            "declared pixel count {declared} exceeds the decode ceiling {max_decode_pixels}"
        )));
    }

    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PrepError::decode(format!("cannot inspect image bytes: {e}")))?
        .decode()
        .map_err(|e| PrepError::decode(format!("image decode failed: {e}")))
}

fn encode_crop(
    name: &str,
    img: &DynamicImage,
    format: OutputFormat,
    quality: u8,
) -> Option<Vec<u8>> {
    match encode_image(img, format, quality) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!(name, "failed to encode strategy crop: {e}");
            None
        }
    }
}

/// Display/Vision branch: flatten alpha, optional grayscale, pixel-budget
/// resize, encode. Each transformation that changed the image records a
/// frame. An encode failure here fails the whole call.
fn finish_display(
    main: &DynamicImage,
    config: &MergedConfig,
    format: OutputFormat,
    sink: &mut DebugSink,
) -> crate::error::Result<EncodedImage> {
    let had_alpha = main.color().has_alpha();
    let flat = DynamicImage::ImageRgb8(flatten_onto_white(main));
    if had_alpha {
        sink.push("Display/Vision - RGB Converted", &flat, OutputFormat::Png);
    }

    let toned = if config.apply_grayscale {
        let gray = DynamicImage::ImageLuma8(flat.to_luma8());
        sink.push("Display/Vision - Grayscale", &gray, OutputFormat::Png);
        gray
    } else {
        flat
    };

    let before = (toned.width(), toned.height());
    let resized = resize_to_pixel_budget(&toned, config.max_pixels);
    if (resized.width(), resized.height()) != before {
        sink.push("Display/Vision - Resized", &resized, OutputFormat::Png);
    }

    let bytes = encode_image(&resized, format, config.jpeg_quality)?;
    sink.push_encoded(
        "Final Display Image",
        bytes.clone(),
        color_mode_name(&resized),
        (resized.width(), resized.height()),
    );
    Ok(EncodedImage {
        mime: format.mime_type(),
        bytes,
    })
}

/// OCR branch: reuse the contour strategy's pixel-aligned companion crop
/// when present, otherwise binarize the selected main image fresh. Resize,
/// force single-channel, encode as PNG. Failures degrade to "no OCR image".
fn finish_ocr_input(
    selection: &Selection,
    config: &MergedConfig,
    sink: &mut DebugSink,
) -> (Option<EncodedImage>, String) {
    let params = &config.trim_params;
    let (binary, description) = match &selection.companion {
        Some(CompanionImage::Binarized(binary)) => (
            binary.clone(),
            "輪郭トリミングの二値化画像を再利用".to_string(),
        ),
        Some(CompanionImage::Grayscale(gray)) => (
            gray.clone(),
            "輪郭トリミングのグレースケール画像を再利用".to_string(),
        ),
        None => {
            let gray = to_gray(&selection.main);
            let block = params.block_size();
            let c = params.adaptive_thresh_c;
            let binary = adaptive_threshold(&gray, block, c);
            (
                binary,
                format!(
                    "{}を二値化 (block:{block}, c:{c})",
                    selection.source.description()
                ),
            )
        }
    };

    let before = (binary.width(), binary.height());
    let resized =
        resize_to_pixel_budget(&DynamicImage::ImageLuma8(binary), config.max_pixels).to_luma8();
    if (resized.width(), resized.height()) != before {
        sink.push_gray("OCR - Resized", &resized, OutputFormat::Png);
    }
    match encode_image(
        &DynamicImage::ImageLuma8(resized.clone()),
        OutputFormat::Png,
        config.jpeg_quality,
    ) {
        Ok(bytes) => {
            sink.push_encoded(
                format!("Final OCR Input ({})", truncate_chars(&description, 100)),
                bytes.clone(),
                "L",
                (resized.width(), resized.height()),
            );
            (
                Some(EncodedImage {
                    mime: OutputFormat::Png.mime_type(),
                    bytes,
                }),
                description,
            )
        }
        Err(e) => {
            warn!("failed to encode OCR input image, continuing without it: {e}");
            (None, description)
        }
    }
}

/// Truncate to at most `max` characters, never splitting a code point.
fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
