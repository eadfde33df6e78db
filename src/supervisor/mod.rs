//! Supervisor module: job lifecycle, event routing and progress tracking.

mod emitter;
mod progress;
mod runner;
mod state;

pub use emitter::*;
pub use progress::*;
pub use runner::*;
pub use state::*;
