//! Error types for captcha resolution.
//!
//! This module defines the error taxonomy shared by both solving strategies:
//! fetch failures, image decode failures, shape mismatches, model artifact
//! problems and prompt surface failures. Every error is terminal for the
//! `solve` call that produced it; retry policy belongs to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type CaptchaResult<T> = Result<T, CaptchaError>;

/// Errors produced while resolving a captcha challenge.
///
/// A `solve` call either returns a complete answer string or exactly one of
/// these variants; it never returns a truncated or best-guess answer.
#[derive(Error, Debug)]
pub enum CaptchaError {
    /// A network fetch (challenge image or model artifact) failed, including
    /// non-2xx responses.
    #[error("fetch failed for '{url}': {message}")]
    Fetch {
        /// The URL that was requested.
        url: String,
        /// What went wrong (transport error, HTTP status, short body).
        message: String,
        /// The underlying error, when one exists.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The fetched bytes are not a decodable image.
    #[error("image decode")]
    Decode(#[source] image::ImageError),

    /// The decoded image dimensions do not match the model input.
    #[error(
        "input shape mismatch: model expects {expected_width}x{expected_height}, \
         image is {actual_width}x{actual_height}"
    )]
    InputShape {
        /// Width the model was trained for.
        expected_width: u32,
        /// Height the model was trained for.
        expected_height: u32,
        /// Width of the decoded image.
        actual_width: u32,
        /// Height of the decoded image.
        actual_height: u32,
    },

    /// The model artifact exists but could not be parsed into a session.
    #[error("model load from '{}': {message}", path.display())]
    ModelLoad {
        /// Path of the artifact that failed to load.
        path: PathBuf,
        /// Short reason description.
        message: String,
        /// The underlying error, when one exists.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A model download ended before the declared byte count was received.
    /// The canonical path is untouched; only the temporary artifact remains.
    #[error("incomplete download: received {received} of {expected} bytes")]
    IncompleteDownload {
        /// Bytes actually written to the temporary file.
        received: u64,
        /// Bytes the server declared.
        expected: u64,
    },

    /// Running the model or extracting its output failed.
    #[error("inference")]
    Inference(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// An internal invariant was violated (out-of-range class index,
    /// unexpected output rank or width).
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the violation.
        message: String,
    },

    /// Invalid configuration (empty alphabet, zero dimensions, blank URL).
    #[error("configuration: {message}")]
    Config {
        /// A message describing the configuration error.
        message: String,
    },

    /// The interactive prompt surface failed (terminal I/O).
    #[error("prompt: {message}")]
    Prompt {
        /// A message describing the failure.
        message: String,
        /// The underlying error, when one exists.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error from the ONNX Runtime session.
    #[error(transparent)]
    Session(#[from] ort::Error),

    /// Error from tensor shape operations.
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

impl CaptchaError {
    /// Creates a fetch error wrapping an underlying transport error.
    pub fn fetch(
        url: impl Into<String>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a fetch error for a non-2xx HTTP response.
    pub fn fetch_status(url: impl Into<String>, status: u16) -> Self {
        Self::Fetch {
            url: url.into(),
            message: format!("HTTP {}", status),
            source: None,
        }
    }

    /// Creates a model load error with an optional underlying cause.
    pub fn model_load(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: Option<impl std::error::Error + Send + Sync + 'static>,
    ) -> Self {
        Self::ModelLoad {
            path: path.into(),
            message: message.into(),
            source: source.map(|e| Box::new(e) as _),
        }
    }

    /// Creates an inference error from an underlying cause.
    pub fn inference(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Inference(Box::new(source))
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a prompt surface error wrapping an underlying cause.
    pub fn prompt(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Prompt {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a prompt surface error without an underlying cause.
    pub fn prompt_message(message: impl Into<String>) -> Self {
        Self::Prompt {
            message: message.into(),
            source: None,
        }
    }
}

impl From<image::ImageError> for CaptchaError {
    fn from(error: image::ImageError) -> Self {
        Self::Decode(error)
    }
}

impl From<ort::Error<ort::session::builder::SessionBuilder>> for CaptchaError {
    fn from(error: ort::Error<ort::session::builder::SessionBuilder>) -> Self {
        Self::Session(error.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_status_message_contains_code() {
        let err = CaptchaError::fetch_status("http://example.invalid/c.png", 503);
        assert!(err.to_string().contains("HTTP 503"));
        assert!(err.to_string().contains("example.invalid"));
    }

    #[test]
    fn input_shape_message_names_both_shapes() {
        let err = CaptchaError::InputShape {
            expected_width: 175,
            expected_height: 70,
            actual_width: 120,
            actual_height: 40,
        };
        let msg = err.to_string();
        assert!(msg.contains("175x70"));
        assert!(msg.contains("120x40"));
    }

    #[test]
    fn model_load_without_source_displays_path() {
        let err =
            CaptchaError::model_load("/tmp/model.onnx", "parse failure", None::<std::io::Error>);
        assert!(err.to_string().contains("/tmp/model.onnx"));
    }
}
