use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrepError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("Image decode error: {0}")]
    DecodeError(String),

    #[error("Image encode error: {0}")]
    EncodeError(String),

    #[error("OCR engine error: {0}")]
    OcrError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Generates factory methods for [`PrepError`] variants that wrap a `String`.
macro_rules! error_constructors {
    ($(
        $(#[doc = $doc:expr])*
        $method:ident => $variant:ident
    ),* $(,)?) => {
        impl PrepError {
            $(
                $(#[doc = $doc])*
                pub fn $method(msg: impl Into<String>) -> Self {
                    Self::$variant(msg.into())
                }
            )*
        }
    };
}

error_constructors! {
    /// Create a configuration error.
    config => ConfigError,
    /// Create an unsupported-format error.
    unsupported_format => UnsupportedFormat,
    /// Create an image decode error.
    decode => DecodeError,
    /// Create an image encode error.
    encode => EncodeError,
    /// Create an OCR engine error.
    ocr => OcrError,
}

impl From<serde_yml::Error> for PrepError {
    fn from(e: serde_yml::Error) -> Self {
        Self::ConfigError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PrepError>;
