// src/engine/mod.rs

//! Supervised execution engine.
//!
//! - [`supervised`] is the drain/poll/timeout loop with two-stage
//!   termination.
//! - [`runtime`] is the `Supervisor`: workdir preparation, resolution,
//!   terminal wrapping, then the loop.
//! - [`sink`], [`deadline`] and [`interrupt`] are the loop's collaborators.

pub mod deadline;
pub mod interrupt;
pub mod result;
pub mod runtime;
pub mod sink;
pub mod supervised;

pub use deadline::Deadline;
pub use interrupt::InterruptSignal;
pub use result::ExecutionResult;
pub use runtime::Supervisor;
pub use sink::OutputSink;
pub use supervised::{SupervisedProcess, SupervisedRun};
