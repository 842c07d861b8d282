//! Image and label processing for the automated strategy.

pub mod decode;
pub mod preprocess;

pub use decode::AlphabetDecoder;
pub use preprocess::ImagePreprocessor;
