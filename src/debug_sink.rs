//! Ordered, append-only sequence of intermediate images.
//!
//! Purely diagnostic: downstream logic never reads these frames, but the
//! tuning UI renders them so parameter changes can be inspected stage by
//! stage. Encoding failures drop the frame with a warning instead of failing
//! the pipeline.

use image::{DynamicImage, GrayImage};
use tracing::warn;

use crate::ops::color_mode_name;
use crate::ops::encode::{OutputFormat, encode_image};

/// One labeled intermediate image.
#[derive(Debug, Clone)]
pub struct DebugFrame {
    pub label: String,
    pub bytes: Vec<u8>,
    pub color_mode: String,
    pub width: u32,
    pub height: u32,
}

/// Append-only collector for [`DebugFrame`]s.
#[derive(Debug)]
pub struct DebugSink {
    frames: Vec<DebugFrame>,
    jpeg_quality: u8,
}

impl DebugSink {
    pub fn new(jpeg_quality: u8) -> Self {
        DebugSink {
            frames: Vec::new(),
            jpeg_quality,
        }
    }

    /// Encode and append one frame. Failures are logged and skipped.
    pub fn push(&mut self, label: impl Into<String>, img: &DynamicImage, format: OutputFormat) {
        let label = label.into();
        match encode_image(img, format, self.jpeg_quality) {
            Ok(bytes) => self.frames.push(DebugFrame {
                label,
                bytes,
                color_mode: color_mode_name(img).to_string(),
                width: img.width(),
                height: img.height(),
            }),
            Err(e) => warn!(label = %label, "failed to encode debug frame: {e}"),
        }
    }

    /// Append a grayscale intermediate (thresholds, morphology output).
    pub fn push_gray(&mut self, label: impl Into<String>, gray: &GrayImage, format: OutputFormat) {
        let img = DynamicImage::ImageLuma8(gray.clone());
        self.push(label, &img, format);
    }

    /// Append pre-encoded bytes (the final output images are reused as-is).
    pub fn push_encoded(
        &mut self,
        label: impl Into<String>,
        bytes: Vec<u8>,
        color_mode: &str,
        size: (u32, u32),
    ) {
        self.frames.push(DebugFrame {
            label: label.into(),
            bytes,
            color_mode: color_mode.to_string(),
            width: size.0,
            height: size.1,
        });
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn into_frames(self) -> Vec<DebugFrame> {
        self.frames
    }
}
