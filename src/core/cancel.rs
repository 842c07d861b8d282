//! Cooperative cancellation primitive.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A shared one-shot cancellation flag.
///
/// Cloning produces another handle to the same flag. The flag is monotonic:
/// it is set at most once and never reset, so readers need no lock — a plain
/// atomic load suffices. Whichever side finishes first (the user answers, or
/// the caller aborts) sets it; later sets are harmless no-ops.
///
/// Cancellation is best-effort and strategy-specific: the interactive solver
/// honors it at a bounded polling interval, the model solver does not honor
/// it mid-flight (see [`ModelSolver::solve`](crate::solvers::ModelSolver)).
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the flag. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Returns true once [`cancel`](Self::cancel) has been called on any
    /// handle to this token.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
