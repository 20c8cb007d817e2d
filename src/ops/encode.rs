use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageFormat};
use serde::Deserialize;

use super::flatten_onto_white;
use crate::error::{PrepError, Result};

/// Output encodings for finished images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutputFormat {
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }

    /// Map a MIME type to an output format, if this crate can encode it.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/jpeg" => Some(OutputFormat::Jpeg),
            "image/png" => Some(OutputFormat::Png),
            _ => None,
        }
    }
}

/// Encode an image to bytes in the requested format.
///
/// JPEG cannot carry alpha, so alpha-bearing images are composited onto a
/// white background first; grayscale stays single-channel.
pub fn encode_image(img: &DynamicImage, format: OutputFormat, jpeg_quality: u8) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    match format {
        OutputFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut bytes), jpeg_quality);
            match img.color() {
                ColorType::L8 | ColorType::Rgb8 => img
                    .write_with_encoder(encoder)
                    .map_err(|e| PrepError::encode(format!("JPEG encode failed: {e}")))?,
                _ => {
                    let flat = DynamicImage::ImageRgb8(flatten_onto_white(img));
                    flat.write_with_encoder(encoder)
                        .map_err(|e| PrepError::encode(format!("JPEG encode failed: {e}")))?
                }
            }
        }
        OutputFormat::Png => {
            img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
                .map_err(|e| PrepError::encode(format!("PNG encode failed: {e}")))?;
        }
    }
    Ok(bytes)
}
