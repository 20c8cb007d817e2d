//! OCRボックスベースのトリマー: 単語ボックスの外接矩形の和で切り出す。

use image::{DynamicImage, Rgb};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use tracing::{debug, warn};

use super::{CropRect, Region, TrimResult, TrimSkip, pad_and_clamp, union_bounds};
use crate::config::trim::OcrTrimParams;
use crate::debug_sink::DebugSink;
use crate::ocr::{OcrEngine, TextBox};
use crate::ops::encode::OutputFormat;

/// Why a candidate box was rejected, for the color-coded debug render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoxVerdict {
    Accepted,
    TooSmall,
    TooLarge,
    BadAspect,
    LowConfidence,
}

/// Crop the oriented image to the union bounding box of all plausible
/// detected text boxes. Produces no companion binary; binarization for the
/// OCR branch is deferred to the finishing pipeline.
pub fn trim_by_ocr_bounds(
    engine: &dyn OcrEngine,
    oriented: &DynamicImage,
    params: &OcrTrimParams,
    sink: &mut DebugSink,
) -> Result<TrimResult, TrimSkip> {
    if !engine.is_available() {
        debug!("OCR engine unavailable, skipping OCR trim");
        return Err(TrimSkip::EngineUnavailable);
    }
    let (width, height) = (oriented.width(), oriented.height());

    let boxes = match engine.detect_boxes(
        oriented,
        &params.lang,
        &params.tesseract_config,
        params.detect_timeout_secs,
    ) {
        Ok(boxes) => boxes,
        Err(e) => {
            warn!("OCR box detection failed: {e}");
            return Err(TrimSkip::StageFailed(e.to_string()));
        }
    };

    let judged: Vec<(TextBox, BoxVerdict)> = boxes
        .into_iter()
        .map(|b| {
            let verdict = judge_box(&b, params, width, height);
            (b, verdict)
        })
        .collect();

    sink.push(
        "OCRTrim - Text Detection Detail",
        &render_boxes(oriented, &judged, None),
        OutputFormat::Png,
    );

    let regions: Vec<Region> = judged
        .iter()
        .filter(|(_, v)| *v == BoxVerdict::Accepted)
        .map(|(b, _)| Region {
            x: b.x as i64,
            y: b.y as i64,
            width: b.width as i64,
            height: b.height as i64,
            measure: b.confidence as f64,
        })
        .collect();
    debug!(
        candidates = judged.len(),
        accepted = regions.len(),
        "OCR box filtering"
    );
    if regions.is_empty() {
        return Err(TrimSkip::NoRegions);
    }

    let bounds = union_bounds(&regions).ok_or(TrimSkip::NoRegions)?;
    let rect =
        pad_and_clamp(bounds, params.padding, width, height).ok_or(TrimSkip::Degenerate)?;

    sink.push(
        "OCRTrim - Final Cropped",
        &render_boxes(oriented, &judged, Some(rect)),
        OutputFormat::Png,
    );

    Ok(TrimResult {
        main: oriented.crop_imm(rect.x, rect.y, rect.width, rect.height),
        companion: None,
    })
}

/// A box is plausible text iff it clears the confidence floor, carries
/// non-blank text, is no smaller than the absolute pixel floors, no larger
/// than the per-axis ratio ceilings, and has a sane aspect ratio.
fn judge_box(b: &TextBox, params: &OcrTrimParams, width: u32, height: u32) -> BoxVerdict {
    if b.confidence < params.min_confidence || b.text.trim().is_empty() {
        return BoxVerdict::LowConfidence;
    }
    if b.width < params.min_box_width || b.height < params.min_box_height {
        return BoxVerdict::TooSmall;
    }
    if b.width as f64 > width as f64 * params.max_box_width_ratio
        || b.height as f64 > height as f64 * params.max_box_height_ratio
    {
        return BoxVerdict::TooLarge;
    }
    let aspect = b.width as f64 / b.height as f64;
    if aspect < params.min_aspect_ratio || aspect > params.max_aspect_ratio {
        return BoxVerdict::BadAspect;
    }
    BoxVerdict::Accepted
}

/// Debug render of every candidate box, color-coded by verdict:
/// green accepted, red too small, orange too large, magenta bad aspect,
/// gray low confidence, blue for the final crop rectangle.
fn render_boxes(
    oriented: &DynamicImage,
    judged: &[(TextBox, BoxVerdict)],
    final_rect: Option<CropRect>,
) -> DynamicImage {
    let mut canvas = oriented.to_rgb8();
    for (b, verdict) in judged {
        let color = match verdict {
            BoxVerdict::Accepted => Rgb([0, 200, 0]),
            BoxVerdict::TooSmall => Rgb([255, 0, 0]),
            BoxVerdict::TooLarge => Rgb([255, 165, 0]),
            BoxVerdict::BadAspect => Rgb([255, 0, 255]),
            BoxVerdict::LowConfidence => Rgb([128, 128, 128]),
        };
        draw_hollow_rect_mut(
            &mut canvas,
            Rect::at(b.x, b.y).of_size(b.width.max(1), b.height.max(1)),
            color,
        );
    }
    if let Some(rect) = final_rect {
        draw_hollow_rect_mut(
            &mut canvas,
            Rect::at(rect.x as i32, rect.y as i32).of_size(rect.width, rect.height),
            Rgb([0, 0, 255]),
        );
    }
    DynamicImage::ImageRgb8(canvas)
}
