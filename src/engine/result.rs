// src/engine/result.rs

use crate::engine::sink::OutputSink;
use crate::exec::ResolvedCommand;
use crate::types::Outcome;

/// Terminal result of one run, produced exactly once.
#[derive(Debug)]
pub struct ExecutionResult {
    pub outcome: Outcome,
    pub output: OutputSink,
    /// Child pid, when a child was started.
    pub pid: Option<u32>,
    /// The command that was (or would have been) launched.
    pub command: Option<ResolvedCommand>,
}

impl ExecutionResult {
    pub fn exit_code(&self) -> i32 {
        self.outcome.exit_code()
    }

    /// Accumulated output in arrival order.
    pub fn snapshot(&self) -> String {
        self.output.snapshot()
    }
}
