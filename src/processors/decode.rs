//! Class index to text decoding.

use crate::core::config::ChallengeSpec;
use crate::core::errors::{CaptchaError, CaptchaResult};

/// Maps per-position class indices to characters of a fixed ordered alphabet.
///
/// Unlike CTC-style decoders there is no blank token and no duplicate
/// collapsing: the model emits exactly one class per answer position. An
/// out-of-range index means the model output width and the configured
/// alphabet disagree; that is an invariant violation and fails the call
/// rather than being clamped or skipped.
#[derive(Debug, Clone)]
pub struct AlphabetDecoder {
    alphabet: Vec<char>,
}

impl AlphabetDecoder {
    /// Creates a decoder over `alphabet`.
    ///
    /// # Errors
    ///
    /// Returns `CaptchaError::Config` if the alphabet is empty.
    pub fn new(alphabet: &[char]) -> CaptchaResult<Self> {
        if alphabet.is_empty() {
            return Err(CaptchaError::config("alphabet must not be empty"));
        }
        Ok(Self {
            alphabet: alphabet.to_vec(),
        })
    }

    /// Creates a decoder from a challenge spec.
    pub fn from_spec(spec: &ChallengeSpec) -> CaptchaResult<Self> {
        Self::new(&spec.alphabet)
    }

    /// Number of characters in the vocabulary.
    pub fn class_count(&self) -> usize {
        self.alphabet.len()
    }

    /// Decodes a class sequence into text, one character per position.
    ///
    /// # Errors
    ///
    /// Returns `CaptchaError::InvalidInput` on any out-of-range index.
    pub fn decode(&self, indices: &[usize]) -> CaptchaResult<String> {
        indices
            .iter()
            .map(|&idx| {
                self.alphabet.get(idx).copied().ok_or_else(|| {
                    CaptchaError::invalid_input(format!(
                        "class index {} out of range for alphabet of {} characters",
                        idx,
                        self.alphabet.len()
                    ))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_leading_indices_of_lowercase_alphabet() {
        let decoder = AlphabetDecoder::from_spec(&ChallengeSpec::default()).unwrap();
        assert_eq!(decoder.decode(&[0, 1, 2, 3]).unwrap(), "abcd");
    }

    #[test]
    fn decodes_arbitrary_positions() {
        let decoder = AlphabetDecoder::from_spec(&ChallengeSpec::default()).unwrap();
        assert_eq!(decoder.decode(&[25, 0, 25, 0]).unwrap(), "zaza");
    }

    #[test]
    fn empty_sequence_decodes_to_empty_string() {
        let decoder = AlphabetDecoder::from_spec(&ChallengeSpec::default()).unwrap();
        assert_eq!(decoder.decode(&[]).unwrap(), "");
    }

    #[test]
    fn out_of_range_index_fails_loudly() {
        let decoder = AlphabetDecoder::from_spec(&ChallengeSpec::default()).unwrap();
        let err = decoder.decode(&[0, 26, 2, 3]).unwrap_err();
        match err {
            CaptchaError::InvalidInput { message } => {
                assert!(message.contains("26"));
                assert!(message.contains("out of range"));
            }
            other => panic!("expected invalid input, got {other:?}"),
        }
    }

    #[test]
    fn empty_alphabet_is_rejected_at_construction() {
        assert!(AlphabetDecoder::new(&[]).is_err());
    }
}
