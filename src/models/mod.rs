//! Model artifact management.

pub mod assets;

pub use assets::{ensure, ModelHandle};
