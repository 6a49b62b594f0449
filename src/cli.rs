// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `kimi-run`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "kimi-run",
    version,
    about = "Run the Kimi CLI under supervision: live output, timeout, framed result.",
    long_about = None
)]
pub struct CliArgs {
    /// Task prompt passed to the tool.
    #[arg(short = 'p', long, value_name = "TEXT")]
    pub prompt: String,

    /// Working directory; created if it does not exist.
    #[arg(short = 'w', long, value_name = "DIR", default_value = ".")]
    pub workdir: PathBuf,

    /// Timeout in seconds.
    ///
    /// If omitted, `[runner].default_timeout_secs` from the settings file
    /// (3600 by default) is used.
    #[arg(short = 't', long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Path to the task metadata JSON file (passed through).
    #[arg(long, value_name = "PATH")]
    pub meta_file: Option<PathBuf>,

    /// Comma-separated list of allowed tools, e.g. "read,exec,write".
    #[arg(long, value_name = "LIST")]
    pub allowed_tools: Option<String>,

    /// Runner settings file (TOML). Falls back to `KIMI_RUN_CONFIG`.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Never wrap the tool in a pseudo-terminal helper.
    #[arg(long)]
    pub no_pty: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `KIMI_RUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
