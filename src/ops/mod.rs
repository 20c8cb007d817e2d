pub mod binarize;
pub mod encode;
pub mod resize;

use image::{DynamicImage, Rgb, RgbImage};

/// Convert an image to RGB, compositing any alpha channel onto a white
/// background.
///
/// Premultiplying onto black would produce false dark borders around
/// transparent regions, which later thresholding would pick up as text.
pub fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    let mut out = RgbImage::from_pixel(rgba.width(), rgba.height(), Rgb([255, 255, 255]));
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let a = a as u16;
        let blend = |c: u8| ((c as u16 * a + 255 * (255 - a)) / 255) as u8;
        out.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    out
}

/// Short mode name for an image's color type, used in debug frame metadata.
pub fn color_mode_name(img: &DynamicImage) -> &'static str {
    use image::ColorType;
    match img.color() {
        ColorType::L8 | ColorType::L16 => "L",
        ColorType::La8 | ColorType::La16 => "LA",
        ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => "RGB",
        ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => "RGBA",
        _ => "?",
    }
}
