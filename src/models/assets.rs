//! Model artifact acquisition and caching.
//!
//! The recognition model is fetched once, stored at a configured local path
//! and parsed into an ONNX Runtime session that lives for the rest of the
//! process. Downloads go through a temporary sibling path and are renamed
//! into place only after the full byte count arrived, so a reader never
//! observes a partially written artifact at the canonical path: an
//! interrupted transfer leaves only the `.tmp` file and the next attempt
//! starts clean.

use crate::core::errors::{CaptchaError, CaptchaResult};
use crate::core::progress::{download_progress_line, ProgressSink};
use crate::utils::http;
use once_cell::sync::Lazy;
use ort::logging::LogLevel;
use ort::session::Session;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// A loaded, inference-ready model shared across solve calls.
///
/// `ort` sessions need exclusive access while running, so the handle wraps
/// the session in a mutex; clones share the same underlying session.
pub type ModelHandle = Arc<Mutex<Session>>;

/// Suffix of the temporary download path next to the canonical one.
const TEMP_SUFFIX: &str = ".tmp";

/// Stream chunk size for model downloads.
const CHUNK_SIZE: usize = 8 * 1024;

/// Process-wide cache of loaded models, keyed by artifact path.
///
/// The mutex is held across first-use download and parse, which serializes
/// concurrent first callers of the same path: exactly one of them writes the
/// temporary file, the rest find the handle already cached.
static MODEL_CACHE: Lazy<Mutex<HashMap<PathBuf, ModelHandle>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Ensures the model at `path` is present and loaded, downloading it from
/// `source_url` first if the file is missing.
///
/// The returned handle is cached for the process lifetime; a second call
/// with the same path returns the same handle without touching the network
/// or re-parsing the file.
///
/// # Errors
///
/// * [`CaptchaError::Fetch`] / [`CaptchaError::IncompleteDownload`] if the
///   download fails; the canonical path stays untouched.
/// * [`CaptchaError::ModelLoad`] if the artifact cannot be parsed. Neither
///   case is retried internally.
pub fn ensure(path: &Path, source_url: &str, sink: &dyn ProgressSink) -> CaptchaResult<ModelHandle> {
    let mut cache = MODEL_CACHE
        .lock()
        .map_err(|_| CaptchaError::invalid_input("model cache lock poisoned"))?;

    if let Some(handle) = cache.get(path) {
        tracing::debug!("reusing cached model session for {}", path.display());
        return Ok(Arc::clone(handle));
    }

    if !path.exists() {
        download_model(path, source_url, sink)?;
    }

    let session = load_session(path)?;
    let handle: ModelHandle = Arc::new(Mutex::new(session));
    cache.insert(path.to_path_buf(), Arc::clone(&handle));
    Ok(handle)
}

/// Parses the artifact at `path` into an ONNX Runtime session.
fn load_session(path: &Path) -> CaptchaResult<Session> {
    let session = Session::builder()?
        .with_log_level(LogLevel::Error)?
        .commit_from_file(path)
        .map_err(|e| {
            CaptchaError::model_load(path, "failed to create ONNX session", Some(e))
        })?;
    tracing::debug!("loaded model session from {}", path.display());
    Ok(session)
}

/// Downloads `source_url` into the temporary sibling of `path`, then renames
/// it into place.
pub(crate) fn download_model(
    path: &Path,
    source_url: &str,
    sink: &dyn ProgressSink,
) -> CaptchaResult<()> {
    sink.status(&format!("downloading model from {}", source_url));

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp = temp_path(path);
    let mut response = http::get(source_url)?;
    let total = response.content_length();

    // File::create truncates, so a stale temp artifact from an earlier
    // interrupted transfer never leaks into this one.
    let mut file = File::create(&temp)?;
    stream_to_file(&mut response, &mut file, total, sink)?;
    file.flush()?;
    drop(file);

    fs::rename(&temp, path)?;
    sink.status("model download finished");
    tracing::debug!("model stored at {}", path.display());
    Ok(())
}

/// Temporary download path next to the canonical one.
pub(crate) fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}

/// Copies `reader` into `writer` in chunks, reporting progress after each
/// chunk and verifying the declared byte count at the end.
///
/// # Errors
///
/// Returns [`CaptchaError::IncompleteDownload`] if the stream ends before
/// `total` bytes arrived. The bytes written so far are left in `writer`.
pub(crate) fn stream_to_file(
    reader: &mut impl Read,
    writer: &mut impl Write,
    total: Option<u64>,
    sink: &dyn ProgressSink,
) -> CaptchaResult<u64> {
    let mut buf = [0u8; CHUNK_SIZE];
    let mut written: u64 = 0;

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n])?;
        written += n as u64;
        sink.status(&download_progress_line(written, total));
    }

    if let Some(expected) = total {
        if written != expected {
            return Err(CaptchaError::IncompleteDownload {
                received: written,
                expected,
            });
        }
    }

    Ok(written)
}
