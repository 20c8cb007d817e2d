use super::settings::Settings;
use super::trim::{TrimParams, TrimStrategy};
use crate::ops::encode::OutputFormat;

/// Per-call overrides for [`preprocess`](crate::pipeline::preprocessor::preprocess).
///
/// Every field is optional; `None` defers to [`Settings`].
#[derive(Debug, Clone, Default)]
pub struct PreprocessOverrides {
    pub max_pixels: Option<u64>,
    pub output_format: Option<OutputFormat>,
    pub jpeg_quality: Option<u8>,
    pub grayscale: Option<bool>,
    pub apply_contour_trim: Option<bool>,
    pub trim_params: Option<TrimParams>,
    /// Strategy name string; unknown values fall back with a warning.
    pub trimming_strategy: Option<String>,
}

/// Effective configuration for one `preprocess` call.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub max_pixels: u64,
    pub output_format: OutputFormat,
    pub jpeg_quality: u8,
    pub apply_grayscale: bool,
    pub trimming_strategy: TrimStrategy,
    pub trim_params: TrimParams,
}

impl MergedConfig {
    /// オーバーライドがSomeならその値を、NoneならSettingsの値を使用する。
    pub fn new(settings: &Settings, overrides: &PreprocessOverrides) -> Self {
        let mut trim_params = overrides
            .trim_params
            .clone()
            .unwrap_or_else(|| settings.trimming.clone());
        if let Some(apply) = overrides.apply_contour_trim {
            trim_params.apply = apply;
        }

        let trimming_strategy = overrides
            .trimming_strategy
            .as_deref()
            .map(TrimStrategy::parse_lossy)
            .unwrap_or(settings.trimming_strategy);

        MergedConfig {
            max_pixels: overrides.max_pixels.unwrap_or(settings.max_pixels),
            output_format: overrides.output_format.unwrap_or(settings.output_format),
            jpeg_quality: overrides.jpeg_quality.unwrap_or(settings.jpeg_quality),
            apply_grayscale: overrides.grayscale.unwrap_or(settings.apply_grayscale),
            trimming_strategy,
            trim_params,
        }
    }
}
