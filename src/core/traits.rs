//! The solver capability.

use crate::core::cancel::CancelToken;
use crate::core::errors::CaptchaResult;

/// One interchangeable captcha resolution strategy.
///
/// Given a locator for the challenge image (a URL the raw bytes can be
/// fetched from) a solver produces the plaintext answer or a typed failure;
/// never a partial answer.
///
/// `cancel` is a cooperative signal: a strategy that supports early
/// termination observes it at a bounded interval and returns promptly once it
/// is set. Strategies that cannot safely interrupt their work document that
/// and ignore the token.
pub trait Solver {
    /// Resolves the challenge at `challenge_url` into its plaintext answer.
    fn solve(&self, challenge_url: &str, cancel: Option<&CancelToken>) -> CaptchaResult<String>;
}
