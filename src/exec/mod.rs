// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`resolve`] finds the tool binary (override variable, then PATH).
//! - [`wrap`] decides whether to run the tool under a pseudo-terminal helper
//!   and builds the shell-quoted wrapped argument vector.
//! - [`command`] holds `ResolvedCommand` and the tool argument layout.
//! - [`backend`] provides the `ProcessBackend` / `ProcessHandle` traits the
//!   engine drives, which tests replace with a fake implementation.
//! - [`process`] is the real backend on top of `tokio::process`.

pub mod backend;
pub mod command;
pub mod process;
pub mod resolve;
pub mod wrap;

pub use backend::{ProcessBackend, ProcessHandle, SpawnedProcess};
pub use command::{ResolvedCommand, tool_argv};
pub use process::RealProcessBackend;
pub use resolve::{CommandResolver, Resolution, probe_executable};
pub use wrap::{TerminalWrapDecider, quote_command};
