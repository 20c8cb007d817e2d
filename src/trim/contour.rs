//! 輪郭ベースのトリマー: 連結成分の外接矩形の和で切り出す。

use std::collections::HashMap;

use image::{DynamicImage, Luma, Rgb};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use imageproc::region_labelling::{Connectivity, connected_components};
use tracing::{debug, warn};

use super::{CompanionImage, CropRect, Region, TrimResult, TrimSkip, pad_and_clamp, union_bounds};
use crate::config::trim::TrimParams;
use crate::debug_sink::DebugSink;
use crate::ops::binarize::{MorphOp, adaptive_threshold, gaussian_blur, morphology, to_gray};
use crate::ops::encode::OutputFormat;

/// Crop the oriented image to the union bounding box of all sufficiently
/// large connected foreground components.
///
/// On success the result carries both the color crop and the pixel-aligned
/// crop of the binary intermediate, so the OCR branch can skip
/// re-binarization. Any failure or empty detection degrades to [`TrimSkip`];
/// the caller falls back to the uncropped oriented image.
pub fn trim_by_contours(
    oriented: &DynamicImage,
    params: &TrimParams,
    sink: &mut DebugSink,
) -> Result<TrimResult, TrimSkip> {
    let (width, height) = (oriented.width(), oriented.height());
    if width == 0 || height == 0 {
        return Err(TrimSkip::StageFailed("empty input image".to_string()));
    }

    // 固定順: グレースケール → ブラー → 適応的閾値 → オープン → クローズ
    let gray = to_gray(oriented);
    sink.push_gray("ContourTrim - 1. Grayscale", &gray, OutputFormat::Png);

    let blurred = if params.gaussian_blur_kernel != (0, 0) {
        let blurred = gaussian_blur(&gray, params.gaussian_blur_kernel);
        sink.push_gray("ContourTrim - 2. Blurred", &blurred, OutputFormat::Png);
        blurred
    } else {
        gray
    };

    let block = params.block_size();
    let c = params.adaptive_thresh_c;
    let mut binary = adaptive_threshold(&blurred, block, c);
    sink.push_gray(
        format!("ContourTrim - 3. Threshold (B{block}, C{c})"),
        &binary,
        OutputFormat::Png,
    );

    if params.morph_open_apply {
        binary = morphology(
            &binary,
            MorphOp::Open,
            params.open_kernel(),
            params.morph_open_iterations,
        );
        sink.push_gray("ContourTrim - 4. Morph Open", &binary, OutputFormat::Png);
    }
    if params.morph_close_apply {
        binary = morphology(
            &binary,
            MorphOp::Close,
            params.close_kernel(),
            params.morph_close_iterations,
        );
        sink.push_gray("ContourTrim - 5. Morph Close", &binary, OutputFormat::Png);
    }

    let min_area = width as f64 * height as f64 * params.min_contour_area_ratio;
    let regions = find_components(&binary, min_area);
    if regions.is_empty() {
        debug!("no contour regions above the area floor");
        return Err(TrimSkip::NoRegions);
    }

    let bounds = union_bounds(&regions).ok_or(TrimSkip::NoRegions)?;
    let rect =
        pad_and_clamp(bounds, params.padding, width, height).ok_or(TrimSkip::Degenerate)?;
    debug!(regions = regions.len(), ?rect, "contour trim selected region");

    sink.push(
        "ContourTrim - Detected Regions",
        &render_regions(oriented, &regions, rect),
        OutputFormat::Png,
    );

    let main = oriented.crop_imm(rect.x, rect.y, rect.width, rect.height);
    let binary_crop =
        image::imageops::crop_imm(&binary, rect.x, rect.y, rect.width, rect.height).to_image();

    // 二値切り出しが空なら、切り出し後のグレースケールで代用する。
    let companion = if binary_crop.pixels().any(|p| p.0[0] > 0) {
        CompanionImage::Binarized(binary_crop)
    } else {
        warn!("binary crop contains no foreground, falling back to grayscale crop");
        CompanionImage::Grayscale(to_gray(&main))
    };

    sink.push("ContourTrim - Final Cropped", &main, OutputFormat::Png);

    Ok(TrimResult {
        main,
        companion: Some(companion),
    })
}

/// Connected foreground components with their bounding boxes, filtered by
/// the resolution-independent area floor.
fn find_components(binary: &image::GrayImage, min_area: f64) -> Vec<Region> {
    let labels = connected_components(binary, Connectivity::Eight, Luma([0u8]));

    // label -> (min_x, min_y, max_x, max_y, area)
    let mut stats: HashMap<u32, (u32, u32, u32, u32, u64)> = HashMap::new();
    for (x, y, label) in labels.enumerate_pixels() {
        let label = label.0[0];
        if label == 0 {
            continue;
        }
        let entry = stats.entry(label).or_insert((x, y, x, y, 0));
        entry.0 = entry.0.min(x);
        entry.1 = entry.1.min(y);
        entry.2 = entry.2.max(x);
        entry.3 = entry.3.max(y);
        entry.4 += 1;
    }

    stats
        .into_values()
        .filter(|&(_, _, _, _, area)| area as f64 >= min_area)
        .map(|(min_x, min_y, max_x, max_y, area)| Region {
            x: min_x as i64,
            y: min_y as i64,
            width: (max_x - min_x + 1) as i64,
            height: (max_y - min_y + 1) as i64,
            measure: area as f64,
        })
        .collect()
}

/// Debug render: accepted components in green, the final crop in blue.
fn render_regions(oriented: &DynamicImage, regions: &[Region], rect: CropRect) -> DynamicImage {
    let mut canvas = oriented.to_rgb8();
    for r in regions {
        draw_hollow_rect_mut(
            &mut canvas,
            Rect::at(r.x as i32, r.y as i32).of_size(r.width.max(1) as u32, r.height.max(1) as u32),
            Rgb([0, 255, 0]),
        );
    }
    draw_hollow_rect_mut(
        &mut canvas,
        Rect::at(rect.x as i32, rect.y as i32).of_size(rect.width, rect.height),
        Rgb([0, 0, 255]),
    );
    DynamicImage::ImageRgb8(canvas)
}
