// src/engine/runtime.rs

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::{ExecutionConfig, RunnerSettings};
use crate::engine::deadline::Deadline;
use crate::engine::interrupt::InterruptSignal;
use crate::engine::result::ExecutionResult;
use crate::engine::sink::OutputSink;
use crate::engine::supervised::SupervisedProcess;
use crate::exec::{
    CommandResolver, ProcessBackend, ResolvedCommand, Resolution, TerminalWrapDecider, tool_argv,
};
use crate::host::HostEnv;
use crate::types::{Outcome, Termination};

/// Orchestrates one supervised run of the tool.
///
/// Order: start the deadline, prepare the working directory, resolve the
/// tool, decide terminal wrapping, then hand off to [`SupervisedProcess`].
/// A missing tool, or an interrupt that arrives before launch,
/// short-circuits before any process is spawned.
pub struct Supervisor<B: ProcessBackend> {
    settings: RunnerSettings,
    host: Arc<dyn HostEnv>,
    backend: B,
}

impl<B: ProcessBackend> Supervisor<B> {
    pub fn new(settings: RunnerSettings, host: Arc<dyn HostEnv>, backend: B) -> Self {
        Self {
            settings,
            host,
            backend,
        }
    }

    pub async fn run(
        &self,
        config: &ExecutionConfig,
        mut sink: OutputSink,
        mut interrupt: InterruptSignal,
    ) -> ExecutionResult {
        let deadline = Deadline::start(self.settings.timing.clock, config.timeout());

        if let Some(meta) = config.meta_file() {
            debug!(meta_file = %meta.display(), "metadata file passed through");
        }

        let workdir = match config.prepare_workdir() {
            Ok(dir) => dir,
            Err(err) => return internal(err.to_string(), sink),
        };

        let resolver = CommandResolver::new(Arc::clone(&self.host), &self.settings);
        let program = match resolver.resolve().await {
            Resolution::Override(path) | Resolution::OnPath(path) => path,
            Resolution::NotFound => {
                error!(tool = %resolver.tool(), "tool not found");
                sink.notice(&format!(
                    "[FATAL] {} CLI not found (set {} or add it to PATH)",
                    resolver.tool(),
                    resolver.override_env()
                ));
                return finished(
                    Outcome::NotFound {
                        reason: format!("{} not found", resolver.tool()),
                    },
                    sink,
                );
            }
        };

        let inner = match ResolvedCommand::direct(tool_argv(&program, config, &workdir)) {
            Ok(cmd) => cmd,
            Err(err) => return internal(err.to_string(), sink),
        };
        sink.notice(&format!("[Kimi] Executing: {inner}"));

        let decider = TerminalWrapDecider::new(Arc::clone(&self.host), &self.settings);
        let cmd = match decider.apply(inner).await {
            Ok(cmd) => cmd,
            Err(err) => return internal(err.to_string(), sink),
        };

        // Probes above can take a while; an interrupt during them means the
        // tool is never started.
        if interrupt.poll_fired() {
            warn!("interrupt received before launch");
            sink.notice("\n[INTERRUPT] Received interrupt signal");
            return ExecutionResult {
                outcome: Outcome::Interrupted {
                    termination: Termination::Graceful,
                },
                output: sink,
                pid: None,
                command: Some(cmd),
            };
        }

        info!(
            program = %cmd.program(),
            wrapped = cmd.is_wrapped(),
            timeout_secs = config.timeout().as_secs(),
            "launching tool"
        );

        let run = SupervisedProcess::new(&self.backend, self.settings.timing)
            .run(&cmd, &workdir, deadline, &mut sink, &mut interrupt)
            .await;

        ExecutionResult {
            outcome: run.outcome,
            output: sink,
            pid: run.pid,
            command: Some(cmd),
        }
    }
}

fn finished(outcome: Outcome, output: OutputSink) -> ExecutionResult {
    ExecutionResult {
        outcome,
        output,
        pid: None,
        command: None,
    }
}

fn internal(message: String, mut sink: OutputSink) -> ExecutionResult {
    error!(%message, "run aborted before launch");
    sink.notice(&format!("[ERROR] Unexpected error: {message}"));
    finished(Outcome::Internal { message }, sink)
}
