// src/engine/supervised.rs

//! The supervised execution loop.
//!
//! One task owns the child handle, the deadline and the sink. Each iteration
//! checks for an interrupt, then the deadline, then waits at most one poll
//! interval for the next chunk of merged output. Termination is always
//! graceful first, forced only after the grace window.

use std::path::Path;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::EngineTiming;
use crate::engine::deadline::Deadline;
use crate::engine::interrupt::InterruptSignal;
use crate::engine::sink::OutputSink;
use crate::exec::{ProcessBackend, ProcessHandle, ResolvedCommand, SpawnedProcess};
use crate::types::{Outcome, Termination};

/// Result of one pass through [`SupervisedProcess::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisedRun {
    pub outcome: Outcome,
    /// Child pid, when a child was started.
    pub pid: Option<u32>,
}

enum Step {
    Chunk(String),
    StreamClosed,
    Idle,
    Interrupted,
}

/// Runs one resolved command to a classified outcome.
pub struct SupervisedProcess<'a> {
    backend: &'a dyn ProcessBackend,
    timing: EngineTiming,
}

impl<'a> SupervisedProcess<'a> {
    pub fn new(backend: &'a dyn ProcessBackend, timing: EngineTiming) -> Self {
        Self { backend, timing }
    }

    /// Launch `cmd` in `cwd` and drain it into `sink` until it exits, the
    /// deadline passes, or `interrupt` fires.
    ///
    /// The child handle and its output stream are released before this
    /// returns, whichever path was taken.
    pub async fn run(
        &self,
        cmd: &ResolvedCommand,
        cwd: &Path,
        deadline: Deadline,
        sink: &mut OutputSink,
        interrupt: &mut InterruptSignal,
    ) -> SupervisedRun {
        let SpawnedProcess {
            mut handle,
            mut output,
        } = match self.backend.spawn(cmd, cwd) {
            Ok(spawned) => spawned,
            Err(err) => {
                error!(program = %cmd.program(), error = %err, "failed to start process");
                sink.notice(&format!("[FATAL] Failed to start {}: {err}", cmd.program()));
                return SupervisedRun {
                    outcome: Outcome::NotFound {
                        reason: format!("failed to start {}: {err}", cmd.program()),
                    },
                    pid: None,
                };
            }
        };

        let pid = handle.id();
        info!(
            pid,
            program = %cmd.program(),
            wrapped = cmd.is_wrapped(),
            cwd = %cwd.display(),
            "process started"
        );

        let outcome = self
            .drain(handle.as_mut(), &mut output, &deadline, sink, interrupt)
            .await;

        drop(output);
        drop(handle);
        debug!(pid, elapsed_ms = deadline.elapsed().as_millis() as u64, "process released");

        SupervisedRun { outcome, pid }
    }

    async fn drain(
        &self,
        handle: &mut dyn ProcessHandle,
        output: &mut mpsc::Receiver<String>,
        deadline: &Deadline,
        sink: &mut OutputSink,
        interrupt: &mut InterruptSignal,
    ) -> Outcome {
        let mut stream_open = true;

        loop {
            // Interrupt outranks the deadline.
            if interrupt.poll_fired() {
                return self.interrupted(handle, sink).await;
            }
            if deadline.is_expired() {
                return self.timed_out(handle, deadline, sink).await;
            }

            let wait = self
                .timing
                .poll_interval
                .min(deadline.remaining())
                .max(Duration::from_millis(1));

            let step = if stream_open {
                tokio::select! {
                    biased;
                    _ = interrupt.fired() => Step::Interrupted,
                    recv = tokio::time::timeout(wait, output.recv()) => match recv {
                        Ok(Some(chunk)) => Step::Chunk(chunk),
                        Ok(None) => Step::StreamClosed,
                        Err(_) => Step::Idle,
                    },
                }
            } else {
                tokio::select! {
                    biased;
                    _ = interrupt.fired() => Step::Interrupted,
                    _ = tokio::time::sleep(wait) => Step::Idle,
                }
            };

            match step {
                Step::Interrupted => return self.interrupted(handle, sink).await,
                Step::Chunk(chunk) => {
                    sink.append(chunk);
                    continue;
                }
                Step::StreamClosed => {
                    debug!(pid = handle.id(), "output stream closed");
                    stream_open = false;
                }
                Step::Idle => {}
            }

            match handle.try_wait() {
                Ok(Some(code)) => {
                    if stream_open {
                        self.drain_remaining(output, deadline, sink, interrupt).await;
                    }
                    info!(
                        pid = handle.id(),
                        code,
                        elapsed_ms = deadline.elapsed().as_millis() as u64,
                        "process exited"
                    );
                    return Outcome::Exited { code };
                }
                Ok(None) => {}
                Err(err) => {
                    error!(pid = handle.id(), error = %err, "failed to poll process status");
                    sink.notice(&format!("[ERROR] Unexpected error: {err}"));
                    self.terminate(handle).await;
                    return Outcome::Internal {
                        message: format!("polling process status: {err}"),
                    };
                }
            }
        }
    }

    /// Collect output still buffered after the child exited.
    ///
    /// The whole drain is bounded by `drain_timeout` (and by whatever is left
    /// of the deadline), and an interrupt cuts it short. A grandchild that
    /// keeps writing to the inherited pipe cannot stall the run.
    async fn drain_remaining(
        &self,
        output: &mut mpsc::Receiver<String>,
        deadline: &Deadline,
        sink: &mut OutputSink,
        interrupt: &mut InterruptSignal,
    ) {
        let budget = self.timing.drain_timeout.min(deadline.remaining());
        let cutoff = tokio::time::sleep(budget);
        tokio::pin!(cutoff);

        loop {
            tokio::select! {
                biased;
                _ = interrupt.fired() => {
                    debug!("interrupt during trailing drain; abandoning output stream");
                    return;
                }
                _ = &mut cutoff => {
                    warn!(
                        drain_ms = budget.as_millis() as u64,
                        "output stream still open after exit; abandoning it"
                    );
                    return;
                }
                recv = output.recv() => match recv {
                    Some(chunk) => sink.append(chunk),
                    None => return,
                },
            }
        }
    }

    async fn timed_out(
        &self,
        handle: &mut dyn ProcessHandle,
        deadline: &Deadline,
        sink: &mut OutputSink,
    ) -> Outcome {
        warn!(
            pid = handle.id(),
            timeout_ms = deadline.timeout().as_millis() as u64,
            "deadline exceeded"
        );
        sink.notice(&format!(
            "\n[TIMEOUT] Task exceeded {}",
            describe_duration(deadline.timeout())
        ));
        let termination = self.terminate(handle).await;
        Outcome::TimedOut {
            timeout: deadline.timeout(),
            termination,
        }
    }

    async fn interrupted(&self, handle: &mut dyn ProcessHandle, sink: &mut OutputSink) -> Outcome {
        warn!(pid = handle.id(), "interrupt received");
        sink.notice("\n[INTERRUPT] Received interrupt signal");
        let termination = self.terminate(handle).await;
        Outcome::Interrupted { termination }
    }

    /// Graceful signal, bounded wait, then forced kill.
    async fn terminate(&self, handle: &mut dyn ProcessHandle) -> Termination {
        let pid = handle.id();

        if let Ok(Some(code)) = handle.try_wait() {
            debug!(pid, code, "process already exited before termination");
            return Termination::Graceful;
        }

        if let Err(err) = handle.terminate() {
            warn!(pid, error = %err, "graceful termination signal failed");
        } else {
            info!(
                pid,
                grace_ms = self.timing.grace_period.as_millis() as u64,
                "sent graceful termination signal"
            );
        }

        match tokio::time::timeout(self.timing.grace_period, handle.wait()).await {
            Ok(Ok(code)) => {
                info!(pid, code, "process exited after graceful signal");
                return Termination::Graceful;
            }
            Ok(Err(err)) => warn!(pid, error = %err, "waiting after graceful signal failed"),
            Err(_) => info!(pid, "grace period elapsed; forcing kill"),
        }

        match tokio::time::timeout(self.timing.grace_period, handle.kill()).await {
            Ok(Ok(())) => info!(pid, "process force-killed"),
            Ok(Err(err)) => warn!(pid, error = %err, "forced kill failed"),
            Err(_) => warn!(pid, "process still not reaped after forced kill"),
        }
        Termination::Forced
    }
}

/// `"5 seconds"` for whole seconds, `"0.250 seconds"` otherwise.
fn describe_duration(d: Duration) -> String {
    if d.subsec_nanos() == 0 {
        format!("{} seconds", d.as_secs())
    } else {
        format!("{:.3} seconds", d.as_secs_f64())
    }
}
