use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use super::trim::{TrimParams, TrimStrategy};
use crate::ops::encode::OutputFormat;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Decode ceiling (decompression-bomb guard): declared pixel counts
    /// above this fail the call before full decode.
    pub max_decode_pixels: u64,
    /// MIME types accepted as-is.
    pub supported_mime_types: Vec<String>,
    /// MIME types converted before use, mapped to their target MIME type.
    pub convertable_mime_types: HashMap<String, String>,
    /// Pixel budget (width * height) for the finished images.
    pub max_pixels: u64,
    pub output_format: OutputFormat,
    pub jpeg_quality: u8,
    /// Convert the display image to grayscale in the finishing pipeline.
    pub apply_grayscale: bool,
    pub trimming_strategy: TrimStrategy,
    pub trimming: TrimParams,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            max_decode_pixels: 225_000_000,
            supported_mime_types: vec![
                "image/png".to_string(),
                "image/jpeg".to_string(),
                "image/webp".to_string(),
            ],
            convertable_mime_types: HashMap::from([
                ("image/gif".to_string(), "image/png".to_string()),
                ("image/bmp".to_string(), "image/png".to_string()),
            ]),
            max_pixels: 4_000_000,
            output_format: OutputFormat::Jpeg,
            jpeg_quality: 85,
            apply_grayscale: true,
            trimming_strategy: TrimStrategy::ContourThenOcr,
            trimming: TrimParams::default(),
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        serde_yml::from_str(yaml).map_err(|e| {
            crate::error::PrepError::config(format!("Failed to parse settings YAML: {e}"))
        })
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}
