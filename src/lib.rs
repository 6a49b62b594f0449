// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod host;
pub mod logging;
pub mod report;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::{ExecutionConfig, RunnerSettings, load_settings, settings_path};
use crate::engine::{ExecutionResult, InterruptSignal, OutputSink, Supervisor};
use crate::exec::RealProcessBackend;
use crate::host::RealHostEnv;
use crate::types::PtyMode;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - settings loading
/// - per-run configuration from CLI arguments
/// - Ctrl-C handling (turned into an interrupt for the run)
/// - the supervisor with the real host and process backend
/// - the framed result block on stdout
///
/// Returns the process exit code.
pub async fn run(args: CliArgs) -> Result<i32> {
    let settings = resolve_settings(&args)?;
    let config = execution_config(&args, &settings)?;

    // Ctrl-C → interrupt the supervised run.
    let (interrupt_tx, interrupt) = InterruptSignal::channel();
    let ctrl_c = tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            return;
        }
        let _ = interrupt_tx.send(());
    });

    let supervisor = Supervisor::new(settings, Arc::new(RealHostEnv), RealProcessBackend);
    let result = supervisor
        .run(&config, OutputSink::stderr(), interrupt)
        .await;
    ctrl_c.abort();

    print_result(&result)?;
    Ok(result.exit_code())
}

fn resolve_settings(args: &CliArgs) -> Result<RunnerSettings> {
    let path = settings_path(args.config.as_deref());
    let mut settings = load_settings(path.as_deref())
        .with_context(|| format!("loading runner settings from {path:?}"))?;

    if args.no_pty {
        settings.pty.mode = PtyMode::Never;
    }
    Ok(settings)
}

fn execution_config(args: &CliArgs, settings: &RunnerSettings) -> Result<ExecutionConfig> {
    let timeout = args
        .timeout
        .map(Duration::from_secs)
        .unwrap_or(settings.default_timeout);

    let config = ExecutionConfig::builder(args.prompt.clone())
        .workdir(&args.workdir)
        .timeout(timeout)
        .allowed_tools(args.allowed_tools.clone())
        .meta_file(args.meta_file.clone())
        .build()?;
    Ok(config)
}

fn print_result(result: &ExecutionResult) -> Result<()> {
    info!(
        code = result.exit_code(),
        outcome = ?result.outcome,
        chunks = result.output.chunks().len(),
        "run finished"
    );
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    report::write_framed(&mut out, &result.snapshot()).context("writing framed output")?;
    Ok(())
}
