// src/exec/backend.rs

//! Pluggable process backend abstraction.
//!
//! The engine talks to a `ProcessBackend` instead of `tokio::process`
//! directly. Production uses [`RealProcessBackend`](super::RealProcessBackend);
//! tests can provide a backend whose "child" is scripted in memory and which
//! records the signals it receives.

use std::future::Future;
use std::io;
use std::path::Path;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::exec::command::ResolvedCommand;

/// Boxed future returned by [`ProcessHandle`] methods.
pub type HandleFuture<'a, T> = Pin<Box<dyn Future<Output = io::Result<T>> + Send + 'a>>;

/// A started child: its control handle plus the merged output stream.
///
/// `output` yields chunks (one line each, newline included when present) in
/// arrival order and closes when the child's output reaches end-of-stream.
pub struct SpawnedProcess {
    pub handle: Box<dyn ProcessHandle>,
    pub output: mpsc::Receiver<String>,
}

/// Trait abstracting how a resolved command is started.
pub trait ProcessBackend: Send + Sync {
    /// Start `cmd` with `cwd` as its working directory and stdout+stderr
    /// merged into `SpawnedProcess::output`.
    ///
    /// An error here means the executable could not be started at all.
    fn spawn(&self, cmd: &ResolvedCommand, cwd: &Path) -> io::Result<SpawnedProcess>;
}

/// Control surface over one running child.
///
/// Dropping the handle must release the child (kill it if still running)
/// and its pipes.
pub trait ProcessHandle: Send {
    /// OS process id, if known.
    fn id(&self) -> Option<u32>;

    /// Non-blocking exit check.
    fn try_wait(&mut self) -> io::Result<Option<i32>>;

    /// Wait for the child to exit and return its exit code.
    fn wait(&mut self) -> HandleFuture<'_, i32>;

    /// Ask the child to stop (SIGTERM to its process group on Unix).
    fn terminate(&mut self) -> io::Result<()>;

    /// Force the child down (SIGKILL to its process group on Unix) and reap
    /// it.
    fn kill(&mut self) -> HandleFuture<'_, ()>;
}
