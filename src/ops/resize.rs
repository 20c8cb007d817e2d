use image::DynamicImage;
use image::imageops::FilterType;

/// Shrink an image so its total pixel count stays within `max_pixels`,
/// preserving aspect ratio. Images already within budget are returned
/// unchanged; a budget of 0 disables the resize.
pub fn resize_to_pixel_budget(img: &DynamicImage, max_pixels: u64) -> DynamicImage {
    if max_pixels == 0 {
        return img.clone();
    }
    let current = img.width() as u64 * img.height() as u64;
    if current <= max_pixels {
        return img.clone();
    }

    let scale = (max_pixels as f64 / current as f64).sqrt();
    let new_width = (img.width() as f64 * scale) as u32;
    let new_height = (img.height() as f64 * scale) as u32;
    if new_width < 1 || new_height < 1 {
        return img.clone();
    }
    img.resize_exact(new_width, new_height, FilterType::Lanczos3)
}
