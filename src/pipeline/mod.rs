pub mod batch;
pub mod preprocessor;

pub use batch::preprocess_batch;
pub use preprocessor::{
    EncodedImage, PreprocessFailure, ProcessingOutcome, preprocess,
};
