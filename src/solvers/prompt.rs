//! The interactive prompt surface.
//!
//! The terminal implementation shows the challenge image through the
//! platform image viewer (the bytes are written to a temporary file that
//! lives for the duration of the prompt) and collects one line of input in
//! raw mode. Submission happens on Enter only; Esc, Ctrl+C and other ambient
//! "close" keys are deliberately ignored so an abandoned prompt cannot
//! terminate with a garbage answer — the only other way out is the
//! programmatic close issued by the cancellation watcher.

use crate::core::errors::{CaptchaError, CaptchaResult};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal;
use std::io::Write as _;
use std::path::Path;
use std::process::Command;
use std::time::{Duration, Instant};

/// What a [`PromptSurface::pump`] slice observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpOutcome {
    /// The human triggered the submit affordance.
    Submitted,
    /// The slice elapsed without a terminal event.
    Pending,
}

/// A blocking prompt surface the interactive solver drives.
///
/// The surface is pumped in bounded slices so the foreground loop can check
/// the forced-close flag between slices; it never blocks indefinitely inside
/// one call.
pub trait PromptSurface {
    /// Renders the challenge and prepares for input.
    fn open(&mut self, image: &[u8]) -> CaptchaResult<()>;

    /// Processes input events for up to `budget`.
    fn pump(&mut self, budget: Duration) -> CaptchaResult<PumpOutcome>;

    /// Tears the surface down. Must be safe to call after a failed `open`.
    fn close(&mut self);

    /// Returns the text currently in the input field, consuming it.
    fn take_input(&mut self) -> String;
}

/// Terminal-backed prompt: image via the platform viewer, input via a
/// raw-mode line editor.
#[derive(Debug, Default)]
pub struct TerminalPrompt {
    input: String,
    image_file: Option<tempfile::NamedTempFile>,
    raw_mode: bool,
}

impl TerminalPrompt {
    /// Creates an unopened prompt.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one key to the input buffer. Returns true on submit.
    ///
    /// Only Enter submits. Everything that is not a printable character or
    /// Backspace is ignored, including Esc and Ctrl+C.
    pub(crate) fn apply_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Enter => true,
            KeyCode::Char(c) => {
                self.input.push(c);
                print!("{}", c);
                let _ = std::io::stdout().flush();
                false
            }
            KeyCode::Backspace => {
                if self.input.pop().is_some() {
                    print!("\u{8} \u{8}");
                    let _ = std::io::stdout().flush();
                }
                false
            }
            _ => false,
        }
    }
}

impl PromptSurface for TerminalPrompt {
    fn open(&mut self, image: &[u8]) -> CaptchaResult<()> {
        let mut file = tempfile::Builder::new()
            .prefix("captcha-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| CaptchaError::prompt("could not create temp image file", e))?;
        file.write_all(image)
            .and_then(|_| file.flush())
            .map_err(|e| CaptchaError::prompt("could not write challenge image", e))?;

        open_viewer(file.path());
        println!("challenge image: {}", file.path().display());
        println!("type the code from the image and press Enter:");
        self.image_file = Some(file);

        terminal::enable_raw_mode()
            .map_err(|e| CaptchaError::prompt("could not enter raw mode", e))?;
        self.raw_mode = true;
        Ok(())
    }

    fn pump(&mut self, budget: Duration) -> CaptchaResult<PumpOutcome> {
        let deadline = Instant::now() + budget;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let ready = event::poll(remaining)
                .map_err(|e| CaptchaError::prompt("terminal poll failed", e))?;
            if !ready {
                return Ok(PumpOutcome::Pending);
            }

            let ev = event::read()
                .map_err(|e| CaptchaError::prompt("terminal read failed", e))?;
            if let Event::Key(key) = ev {
                if key.kind == KeyEventKind::Press && self.apply_key(key.code) {
                    return Ok(PumpOutcome::Submitted);
                }
            }

            if Instant::now() >= deadline {
                return Ok(PumpOutcome::Pending);
            }
        }
    }

    fn close(&mut self) {
        if self.raw_mode {
            let _ = terminal::disable_raw_mode();
            self.raw_mode = false;
            println!();
        }
        // Dropping the handle removes the temp image file.
        self.image_file = None;
    }

    fn take_input(&mut self) -> String {
        std::mem::take(&mut self.input)
    }
}

/// Best-effort launch of the platform image viewer; failure only logs.
fn open_viewer(path: &Path) {
    let spawned = if cfg!(target_os = "windows") {
        Command::new("cmd").args(["/C", "start", ""]).arg(path).spawn()
    } else if cfg!(target_os = "macos") {
        Command::new("open").arg(path).spawn()
    } else {
        Command::new("xdg-open").arg(path).spawn()
    };

    if let Err(e) = spawned {
        tracing::debug!("could not open image viewer: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_characters_accumulate() {
        let mut prompt = TerminalPrompt::new();
        for c in ['a', 'b', 'c', 'd'] {
            assert!(!prompt.apply_key(KeyCode::Char(c)));
        }
        assert_eq!(prompt.take_input(), "abcd");
    }

    #[test]
    fn backspace_removes_last_character() {
        let mut prompt = TerminalPrompt::new();
        prompt.apply_key(KeyCode::Char('a'));
        prompt.apply_key(KeyCode::Char('x'));
        prompt.apply_key(KeyCode::Backspace);
        prompt.apply_key(KeyCode::Char('b'));
        assert_eq!(prompt.take_input(), "ab");
    }

    #[test]
    fn backspace_on_empty_buffer_is_harmless() {
        let mut prompt = TerminalPrompt::new();
        prompt.apply_key(KeyCode::Backspace);
        assert_eq!(prompt.take_input(), "");
    }

    #[test]
    fn enter_submits_without_touching_buffer() {
        let mut prompt = TerminalPrompt::new();
        prompt.apply_key(KeyCode::Char('z'));
        assert!(prompt.apply_key(KeyCode::Enter));
        assert_eq!(prompt.take_input(), "z");
    }

    #[test]
    fn ambient_close_keys_are_ignored() {
        let mut prompt = TerminalPrompt::new();
        prompt.apply_key(KeyCode::Char('q'));
        assert!(!prompt.apply_key(KeyCode::Esc));
        assert!(!prompt.apply_key(KeyCode::Tab));
        assert_eq!(prompt.take_input(), "q");
    }

    #[test]
    fn take_input_resets_the_buffer() {
        let mut prompt = TerminalPrompt::new();
        prompt.apply_key(KeyCode::Char('a'));
        assert_eq!(prompt.take_input(), "a");
        assert_eq!(prompt.take_input(), "");
    }
}
