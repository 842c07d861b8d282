//! Human-in-the-loop solving strategy.

use crate::core::cancel::CancelToken;
use crate::core::errors::{CaptchaError, CaptchaResult};
use crate::core::progress::{LogSink, ProgressSink};
use crate::core::traits::Solver;
use crate::solvers::prompt::{PromptSurface, PumpOutcome, TerminalPrompt};
use crate::utils::http;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// How often the background watcher checks the cancellation token.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long one foreground pump slice may block on terminal events.
const PUMP_SLICE: Duration = Duration::from_millis(50);

/// Strategy that presents the challenge to a human and blocks for the
/// answer.
///
/// Two execution contexts run during a solve: the foreground pump loop,
/// which owns the prompt surface exclusively, and a background watcher that
/// observes the cancellation token at [`DEFAULT_POLL_INTERVAL`] and forces
/// the prompt closed when it fires. The shared state between them is two
/// one-shot atomic flags ("done" written by the foreground, "close" written
/// by the watcher), so no lock is needed. The watcher is always joined
/// before `solve` returns.
pub struct InteractiveSolver {
    sink: Arc<dyn ProgressSink>,
    poll_interval: Duration,
}

impl InteractiveSolver {
    /// Creates a solver reporting through the default log sink.
    pub fn new() -> Self {
        Self {
            sink: Arc::new(LogSink),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Replaces the status sink.
    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replaces the watcher polling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Drives `surface` until submission, forced close or a surface error.
    ///
    /// Returns whatever text was in the input field at closure time — the
    /// empty string when cancellation fired before any input.
    fn run_prompt<S: PromptSurface>(
        &self,
        mut surface: S,
        image: &[u8],
        cancel: Option<&CancelToken>,
    ) -> CaptchaResult<String> {
        surface.open(image)?;

        let done = Arc::new(AtomicBool::new(false));
        let close = Arc::new(AtomicBool::new(false));

        let watcher = {
            let done = Arc::clone(&done);
            let close = Arc::clone(&close);
            let cancel = cancel.cloned();
            let sink = Arc::clone(&self.sink);
            let interval = self.poll_interval;
            thread::spawn(move || loop {
                if done.load(Ordering::Acquire) {
                    break;
                }
                if cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                    sink.status("closing captcha prompt");
                    close.store(true, Ordering::Release);
                    break;
                }
                thread::sleep(interval);
            })
        };

        let mut pump_result: CaptchaResult<()> = Ok(());
        loop {
            if close.load(Ordering::Acquire) {
                break;
            }
            match surface.pump(PUMP_SLICE) {
                Ok(PumpOutcome::Submitted) => break,
                Ok(PumpOutcome::Pending) => {}
                Err(e) => {
                    pump_result = Err(e);
                    break;
                }
            }
        }

        // The watcher must be gone before the surface (and the input it
        // guards) is torn down.
        done.store(true, Ordering::Release);
        let joined = watcher.join();
        surface.close();

        pump_result?;
        joined.map_err(|_| CaptchaError::prompt_message("cancellation watcher panicked"))?;
        Ok(surface.take_input())
    }
}

impl Default for InteractiveSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver for InteractiveSolver {
    /// Fetches the challenge image and blocks until the human submits,
    /// or until `cancel` is observed by the background watcher.
    ///
    /// A fetch failure fails the call before any prompt opens.
    fn solve(&self, challenge_url: &str, cancel: Option<&CancelToken>) -> CaptchaResult<String> {
        let image = http::fetch_bytes(challenge_url)?;
        self.sink.status("waiting for captcha answer");
        self.run_prompt(TerminalPrompt::new(), &image, cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Instant;

    /// Scripted stand-in for the terminal surface.
    struct FakeSurface {
        /// Pump count after which Submitted is returned; None never submits.
        submit_after: Option<usize>,
        input: String,
        pumps: usize,
        fail_pump: bool,
    }

    impl FakeSurface {
        fn never_submits() -> Self {
            Self {
                submit_after: None,
                input: String::new(),
                pumps: 0,
                fail_pump: false,
            }
        }

        fn submits_with(input: &str, after: usize) -> Self {
            Self {
                submit_after: Some(after),
                input: input.to_string(),
                ..Self::never_submits()
            }
        }
    }

    impl PromptSurface for FakeSurface {
        fn open(&mut self, _image: &[u8]) -> CaptchaResult<()> {
            Ok(())
        }

        fn pump(&mut self, budget: Duration) -> CaptchaResult<PumpOutcome> {
            if self.fail_pump {
                return Err(CaptchaError::prompt_message("terminal vanished"));
            }
            self.pumps += 1;
            if self.submit_after.is_some_and(|n| self.pumps >= n) {
                return Ok(PumpOutcome::Submitted);
            }
            thread::sleep(budget.min(Duration::from_millis(5)));
            Ok(PumpOutcome::Pending)
        }

        fn close(&mut self) {}

        fn take_input(&mut self) -> String {
            std::mem::take(&mut self.input)
        }
    }

    struct RecordingSink(Mutex<Vec<String>>);

    impl ProgressSink for RecordingSink {
        fn status(&self, line: &str) {
            self.0.lock().unwrap().push(line.to_string());
        }
    }

    fn fast_solver() -> InteractiveSolver {
        InteractiveSolver::new().with_poll_interval(Duration::from_millis(10))
    }

    #[test]
    fn pre_set_cancellation_returns_empty_promptly() {
        let token = CancelToken::new();
        token.cancel();

        let started = Instant::now();
        let answer = fast_solver()
            .run_prompt(FakeSurface::never_submits(), b"img", Some(&token))
            .unwrap();

        assert_eq!(answer, "");
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn cancellation_during_wait_unblocks_the_loop() {
        let token = CancelToken::new();
        let remote = token.clone();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            remote.cancel();
        });

        let answer = fast_solver()
            .run_prompt(FakeSurface::never_submits(), b"img", Some(&token))
            .unwrap();

        canceller.join().unwrap();
        assert_eq!(answer, "");
    }

    #[test]
    fn submitted_text_is_returned_verbatim() {
        let answer = fast_solver()
            .run_prompt(FakeSurface::submits_with("abcd", 3), b"img", None)
            .unwrap();
        assert_eq!(answer, "abcd");
    }

    #[test]
    fn submission_wins_without_any_cancel_token() {
        let answer = fast_solver()
            .run_prompt(FakeSurface::submits_with("zq", 1), b"img", None)
            .unwrap();
        assert_eq!(answer, "zq");
    }

    #[test]
    fn cancellation_emits_a_status_line() {
        let sink = Arc::new(RecordingSink(Mutex::new(Vec::new())));
        let token = CancelToken::new();
        token.cancel();

        let solver = fast_solver().with_sink(Arc::clone(&sink) as Arc<dyn ProgressSink>);
        solver
            .run_prompt(FakeSurface::never_submits(), b"img", Some(&token))
            .unwrap();

        let lines = sink.0.lock().unwrap().clone();
        assert!(lines.iter().any(|l| l.contains("closing captcha prompt")));
    }

    #[test]
    fn pump_error_fails_the_call_and_still_joins() {
        let mut surface = FakeSurface::never_submits();
        surface.fail_pump = true;

        let err = fast_solver()
            .run_prompt(surface, b"img", None)
            .unwrap_err();
        assert!(matches!(err, CaptchaError::Prompt { .. }));
    }
}
