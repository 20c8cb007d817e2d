//! OpenCV相当の二値化パイプライン部品。
//!
//! Pure functions over `GrayImage`; malformed parameters degrade to a copy of
//! the input rather than failing the caller.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::distance_transform::Norm;
use tracing::warn;

use super::flatten_onto_white;

/// Convert to a single-channel luma image.
///
/// Alpha-bearing images are first composited onto a white background so
/// transparent regions read as paper, not ink.
pub fn to_gray(img: &DynamicImage) -> GrayImage {
    if img.color().has_alpha() {
        DynamicImage::ImageRgb8(flatten_onto_white(img)).to_luma8()
    } else {
        img.to_luma8()
    }
}

/// Gaussian blur with an OpenCV-style (width, height) kernel.
///
/// Kernel (0, 0) is the documented no-op. Invalid kernels (even or negative
/// sizes) are rejected with a warning and the input is returned unchanged.
pub fn gaussian_blur(gray: &GrayImage, kernel: (u32, u32)) -> GrayImage {
    let (kw, kh) = kernel;
    if kw == 0 || kh == 0 {
        return gray.clone();
    }
    if kw % 2 == 0 || kh % 2 == 0 {
        warn!(kernel = ?kernel, "invalid gaussian blur kernel, expected odd sizes; skipping blur");
        return gray.clone();
    }
    // OpenCVのカーネルサイズ→シグマ換算式
    let k = kw.max(kh) as f32;
    let sigma = 0.3 * ((k - 1.0) * 0.5 - 1.0) + 0.8;
    imageproc::filter::gaussian_blur_f32(gray, sigma.max(0.1))
}

/// Local-mean adaptive threshold, inverted: foreground text becomes 255 and
/// background 0. Every downstream consumer (connected-component search,
/// projection scoring) depends on this convention.
///
/// A pixel is foreground iff `src <= local_mean - c`, where the local mean is
/// taken over a `block_size` square window clamped to the image bounds.
/// `block_size` must already be normalized to an odd value >= 3
/// (see [`crate::config::trim::TrimParams::block_size`]).
pub fn adaptive_threshold(gray: &GrayImage, block_size: u32, c: i32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray.clone();
    }

    // Integral image with a zero row/column of padding.
    let w = width as usize;
    let h = height as usize;
    let mut integral = vec![0u64; (w + 1) * (h + 1)];
    for y in 0..h {
        let mut row_sum = 0u64;
        for x in 0..w {
            row_sum += gray.get_pixel(x as u32, y as u32).0[0] as u64;
            integral[(y + 1) * (w + 1) + (x + 1)] = integral[y * (w + 1) + (x + 1)] + row_sum;
        }
    }

    let radius = (block_size / 2) as i64;
    let mut out = GrayImage::new(width, height);
    for y in 0..h as i64 {
        let y0 = (y - radius).max(0) as usize;
        let y1 = ((y + radius + 1).min(h as i64)) as usize;
        for x in 0..w as i64 {
            let x0 = (x - radius).max(0) as usize;
            let x1 = ((x + radius + 1).min(w as i64)) as usize;
            let area = ((y1 - y0) * (x1 - x0)) as i64;
            let sum = integral[y1 * (w + 1) + x1] + integral[y0 * (w + 1) + x0]
                - integral[y0 * (w + 1) + x1]
                - integral[y1 * (w + 1) + x0];
            let mean = (sum as i64 / area) as i32;
            let src = gray.get_pixel(x as u32, y as u32).0[0] as i32;
            let value = if src <= mean - c { 255 } else { 0 };
            out.put_pixel(x as u32, y as u32, Luma([value]));
        }
    }
    out
}

/// Morphological operation with a square structuring element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorphOp {
    Open,
    Close,
}

/// Apply open (erode then dilate) or close (dilate then erode) to a binary
/// image. `kernel_size` must already be normalized odd >= 1; a kernel of 1
/// is the identity.
pub fn morphology(binary: &GrayImage, op: MorphOp, kernel_size: u32, iterations: u32) -> GrayImage {
    let radius = kernel_size / 2;
    if radius == 0 || iterations == 0 {
        return binary.clone();
    }
    let radius = radius.min(u8::MAX as u32) as u8;

    let mut current = binary.clone();
    for _ in 0..iterations {
        current = match op {
            MorphOp::Open => imageproc::morphology::open(&current, Norm::LInf, radius),
            MorphOp::Close => imageproc::morphology::close(&current, Norm::LInf, radius),
        };
    }
    current
}
