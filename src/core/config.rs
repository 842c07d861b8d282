//! Configuration types for captcha resolution.
//!
//! The challenge geometry (alphabet, answer length, image dimensions) and the
//! model artifact location are explicit configuration rather than constants,
//! so a different model variant only needs a different config value.

use crate::core::errors::{CaptchaError, CaptchaResult};
use std::path::PathBuf;

/// Alphabet the reference recognition model was trained on.
pub const DEFAULT_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz";

/// Answer length the reference recognition model predicts.
pub const DEFAULT_SEQUENCE_LENGTH: usize = 4;

/// Input width (pixels) the reference recognition model expects.
pub const DEFAULT_IMAGE_WIDTH: u32 = 175;

/// Input height (pixels) the reference recognition model expects.
pub const DEFAULT_IMAGE_HEIGHT: u32 = 70;

/// Shape of the challenge a solver is expected to handle.
///
/// Describes both the text side (ordered alphabet, fixed answer length) and
/// the image side (exact input dimensions; images are never resized, a
/// mismatch is rejected instead).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChallengeSpec {
    /// Ordered set of characters the model can predict. The class index at
    /// each answer position selects one character from this list.
    pub alphabet: Vec<char>,
    /// Number of characters in a complete answer.
    pub sequence_length: usize,
    /// Width in pixels the challenge image must have.
    pub image_width: u32,
    /// Height in pixels the challenge image must have.
    pub image_height: u32,
}

impl Default for ChallengeSpec {
    fn default() -> Self {
        Self {
            alphabet: DEFAULT_ALPHABET.chars().collect(),
            sequence_length: DEFAULT_SEQUENCE_LENGTH,
            image_width: DEFAULT_IMAGE_WIDTH,
            image_height: DEFAULT_IMAGE_HEIGHT,
        }
    }
}

impl ChallengeSpec {
    /// Number of classes the model output must carry per answer position.
    pub fn class_count(&self) -> usize {
        self.alphabet.len()
    }

    /// Validates the spec.
    ///
    /// # Errors
    ///
    /// Returns `CaptchaError::Config` if the alphabet is empty, the sequence
    /// length is zero, or either image dimension is zero.
    pub fn validate(&self) -> CaptchaResult<()> {
        if self.alphabet.is_empty() {
            return Err(CaptchaError::config("alphabet must not be empty"));
        }
        if self.sequence_length == 0 {
            return Err(CaptchaError::config(
                "sequence length must be greater than 0",
            ));
        }
        if self.image_width == 0 || self.image_height == 0 {
            return Err(CaptchaError::config(format!(
                "image dimensions must be greater than 0, got {}x{}",
                self.image_width, self.image_height
            )));
        }
        Ok(())
    }
}

/// Configuration for the automated model-based solver.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ModelSolverConfig {
    /// Local path of the model artifact. Downloaded on first use if absent.
    pub model_path: PathBuf,
    /// Remote source the artifact is downloaded from when missing locally.
    pub model_url: String,
    /// Challenge geometry the model was trained for.
    #[serde(default)]
    pub challenge: ChallengeSpec,
}

impl ModelSolverConfig {
    /// Creates a config for the reference challenge geometry.
    pub fn new(model_path: impl Into<PathBuf>, model_url: impl Into<String>) -> Self {
        Self {
            model_path: model_path.into(),
            model_url: model_url.into(),
            challenge: ChallengeSpec::default(),
        }
    }

    /// Replaces the challenge geometry.
    pub fn with_challenge(mut self, challenge: ChallengeSpec) -> Self {
        self.challenge = challenge;
        self
    }

    /// Validates the config.
    ///
    /// # Errors
    ///
    /// Returns `CaptchaError::Config` if the model path or URL is empty, or
    /// the challenge spec itself is invalid.
    pub fn validate(&self) -> CaptchaResult<()> {
        if self.model_path.as_os_str().is_empty() {
            return Err(CaptchaError::config("model path must not be empty"));
        }
        if self.model_url.trim().is_empty() {
            return Err(CaptchaError::config("model URL must not be empty"));
        }
        self.challenge.validate()
    }
}
