//! Operator-facing status side-channel.
//!
//! Solvers report human-readable status lines (download progress, solving
//! notices) through a [`ProgressSink`]. The sink is a pure side-channel and
//! never affects control flow; structured logging goes through `tracing`
//! separately.

/// Receiver for human-readable status lines.
pub trait ProgressSink: Send + Sync {
    /// Delivers one status line.
    fn status(&self, line: &str);
}

/// Sink that discards every line.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn status(&self, _line: &str) {}
}

/// Sink that forwards lines to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn status(&self, line: &str) {
        tracing::info!("{}", line);
    }
}

/// Formats one download progress line.
///
/// With a known total the line carries a right-aligned percentage and a
/// bytes-so-far / total pair, the counter padded to the total's width so
/// consecutive lines align. Without a total it falls back to a plain
/// cumulative byte count.
pub(crate) fn download_progress_line(read: u64, total: Option<u64>) -> String {
    match total {
        Some(total) if total > 0 => {
            let percent = read as f64 * 100.0 / total as f64;
            let width = total.to_string().len();
            format!("{:5.1}% {:>width$} / {}", percent, read, total, width = width)
        }
        _ => format!("read {} bytes", read),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_total_reports_percent_and_alignment() {
        let line = download_progress_line(512, Some(2048));
        assert_eq!(line, " 25.0%  512 / 2048");
    }

    #[test]
    fn completed_transfer_reports_hundred_percent() {
        let line = download_progress_line(2048, Some(2048));
        assert_eq!(line, "100.0% 2048 / 2048");
    }

    #[test]
    fn unknown_total_falls_back_to_byte_count() {
        assert_eq!(download_progress_line(4096, None), "read 4096 bytes");
        assert_eq!(download_progress_line(4096, Some(0)), "read 4096 bytes");
    }
}
