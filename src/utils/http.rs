//! Blocking HTTP helpers.
//!
//! All network I/O in this crate is blocking from the caller's perspective;
//! timeout and backoff policy belong to the application that owns the HTTP
//! session, not to this layer.

use crate::core::errors::{CaptchaError, CaptchaResult};

/// Issues a blocking GET and returns the response after checking the status.
///
/// Non-2xx responses become [`CaptchaError::Fetch`]; the body is not read.
pub(crate) fn get(url: &str) -> CaptchaResult<reqwest::blocking::Response> {
    let response = reqwest::blocking::get(url)
        .map_err(|e| CaptchaError::fetch(url, "request failed", e))?;
    let status = response.status();
    if !status.is_success() {
        return Err(CaptchaError::fetch_status(url, status.as_u16()));
    }
    Ok(response)
}

/// Fetches the full body at `url` into memory.
///
/// Used for challenge images, which are small; model artifacts are streamed
/// to disk instead (see [`crate::models`]).
pub fn fetch_bytes(url: &str) -> CaptchaResult<Vec<u8>> {
    let response = get(url)?;
    let bytes = response
        .bytes()
        .map_err(|e| CaptchaError::fetch(url, "reading body failed", e))?;
    tracing::debug!("fetched {} bytes from {}", bytes.len(), url);
    Ok(bytes.to_vec())
}
