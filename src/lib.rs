//! # captcha-solver
//!
//! Resolves an image-based text challenge into its plaintext answer, as one
//! step inside a larger automated download workflow.
//!
//! Two interchangeable strategies implement the [`Solver`](core::Solver)
//! capability:
//!
//! * [`InteractiveSolver`](solvers::InteractiveSolver) — shows the challenge
//!   to a human and blocks for the typed answer, with cooperative
//!   cancellation from the caller's side.
//! * [`ModelSolver`](solvers::ModelSolver) — runs a pretrained ONNX
//!   character-recognition model over the challenge image. The model
//!   artifact is downloaded on first use and cached for the process
//!   lifetime.
//!
//! ## Modules
//!
//! * [`core`] - Errors, configuration, cancellation and the solver trait
//! * [`models`] - Model artifact download, caching and session loading
//! * [`processors`] - Image preprocessing and label decoding
//! * [`solvers`] - The two strategies and the prompt surface
//! * [`utils`] - HTTP helpers and logging setup
//!
//! ## Example
//!
//! ```no_run
//! use captcha_solver::prelude::*;
//!
//! # fn main() -> CaptchaResult<()> {
//! let config = ModelSolverConfig::new(
//!     "/var/cache/captcha/model.onnx",
//!     "https://example.com/models/captcha.onnx",
//! );
//! let solver = ModelSolver::new(config)?;
//! let answer = solver.solve("https://example.com/challenge.png", None)?;
//! assert_eq!(answer.len(), 4);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod models;
pub mod processors;
pub mod solvers;
pub mod utils;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::core::{
        CancelToken, CaptchaError, CaptchaResult, ChallengeSpec, LogSink, ModelSolverConfig,
        NullSink, ProgressSink, Solver,
    };
    pub use crate::solvers::{InteractiveSolver, ModelSolver};
}
