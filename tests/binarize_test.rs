// 二値化パイプラインのテスト

use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};

use worksheet_prep::config::trim::normalize_odd;
use worksheet_prep::ops::binarize::{
    MorphOp, adaptive_threshold, gaussian_blur, morphology, to_gray,
};

// ============================================================
// 1. グレースケール変換
// ============================================================

#[test]
fn test_to_gray_produces_single_channel() {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([100, 150, 200, 255])));
    let gray = to_gray(&img);
    assert_eq!((gray.width(), gray.height()), (10, 10));
}

#[test]
fn test_to_gray_transparent_becomes_white() {
    // 透過部分は黒ではなく白 (紙) として扱う
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 0])));
    let gray = to_gray(&img);
    assert_eq!(gray.get_pixel(5, 5).0[0], 255);
}

// ============================================================
// 2. 適応的閾値処理
// ============================================================

fn page_with_stroke() -> GrayImage {
    let mut gray = GrayImage::from_pixel(31, 31, Luma([240]));
    for x in 8..24 {
        gray.put_pixel(x, 15, Luma([15]));
    }
    gray
}

#[test]
fn test_threshold_inverts_foreground() {
    let binary = adaptive_threshold(&page_with_stroke(), 11, 7);
    assert_eq!(binary.get_pixel(15, 15).0[0], 255, "text must be foreground");
    assert_eq!(binary.get_pixel(1, 1).0[0], 0, "paper must be background");
}

#[test]
fn test_threshold_output_has_only_two_values() {
    let binary = adaptive_threshold(&page_with_stroke(), 11, 7);
    assert!(binary.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
}

#[test]
fn test_threshold_uniform_image_is_all_background() {
    // 局所平均と一致する画素は src <= mean - c を満たさない
    let gray = GrayImage::from_pixel(20, 20, Luma([128]));
    let binary = adaptive_threshold(&gray, 11, 7);
    assert!(binary.pixels().all(|p| p.0[0] == 0));
}

// ============================================================
// 3. ガウシアンブラー
// ============================================================

#[test]
fn test_blur_disabled_with_zero_kernel() {
    let gray = page_with_stroke();
    assert_eq!(gaussian_blur(&gray, (0, 0)), gray);
}

#[test]
fn test_blur_smooths_the_stroke() {
    let gray = page_with_stroke();
    let blurred = gaussian_blur(&gray, (5, 5));
    let original = gray.get_pixel(15, 15).0[0];
    let smoothed = blurred.get_pixel(15, 15).0[0];
    assert!(smoothed > original, "blur should lighten a dark stroke");
}

// ============================================================
// 4. モルフォロジー
// ============================================================

#[test]
fn test_open_removes_speck_keeps_block() {
    let mut binary = GrayImage::from_pixel(30, 30, Luma([0]));
    binary.put_pixel(2, 2, Luma([255]));
    for y in 10..20 {
        for x in 10..20 {
            binary.put_pixel(x, y, Luma([255]));
        }
    }
    let opened = morphology(&binary, MorphOp::Open, 3, 1);
    assert_eq!(opened.get_pixel(2, 2).0[0], 0, "speck removed");
    assert_eq!(opened.get_pixel(15, 15).0[0], 255, "block kept");
}

#[test]
fn test_close_fills_small_hole() {
    let mut binary = GrayImage::from_pixel(30, 30, Luma([0]));
    for y in 10..20 {
        for x in 10..20 {
            binary.put_pixel(x, y, Luma([255]));
        }
    }
    binary.put_pixel(15, 15, Luma([0]));
    let closed = morphology(&binary, MorphOp::Close, 3, 1);
    assert_eq!(closed.get_pixel(15, 15).0[0], 255, "hole filled");
}

// ============================================================
// 5. 奇数正規化の不変条件
// ============================================================

#[test]
fn test_normalize_odd_invariant() {
    for value in 0..50u32 {
        let block = normalize_odd(value, 3);
        assert!(block >= 3 && block % 2 == 1, "block {value} -> {block}");
        let kernel = normalize_odd(value, 1);
        assert!(kernel >= 1 && kernel % 2 == 1, "kernel {value} -> {kernel}");
    }
}
