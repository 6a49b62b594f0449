// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::types::{DeadlineClock, PtyMode};

pub const DEFAULT_TOOL: &str = "kimi";
pub const DEFAULT_OVERRIDE_ENV: &str = "KIMI_BIN";
pub const DEFAULT_TIMEOUT_SECS: u64 = 3600;
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
pub const DEFAULT_GRACE_PERIOD_MS: u64 = 1_000;
pub const DEFAULT_DRAIN_TIMEOUT_MS: u64 = 500;
pub const DEFAULT_PTY_HELPER: &str = "script";
pub const DEFAULT_PTY_SINK: &str = "/dev/null";

/// Top-level settings file as deserialized from TOML.
///
/// Every key is optional; a missing file is equivalent to an empty one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub runner: RunnerSection,

    #[serde(default)]
    pub pty: PtySection,
}

/// `[runner]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerSection {
    /// Canonical tool name looked up on PATH.
    pub tool: String,
    /// Variable consulted before PATH lookup.
    pub override_env: String,
    pub default_timeout_secs: u64,
    pub probe_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub grace_period_ms: u64,
    pub drain_timeout_ms: u64,
    pub clock: DeadlineClock,
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            tool: DEFAULT_TOOL.to_string(),
            override_env: DEFAULT_OVERRIDE_ENV.to_string(),
            default_timeout_secs: DEFAULT_TIMEOUT_SECS,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            grace_period_ms: DEFAULT_GRACE_PERIOD_MS,
            drain_timeout_ms: DEFAULT_DRAIN_TIMEOUT_MS,
            clock: DeadlineClock::default(),
        }
    }
}

/// `[pty]` section: terminal-allocation helper used to wrap the tool.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PtySection {
    pub mode: PtyMode,
    pub helper: String,
    /// Flags placed between the helper and the quoted command. The last flag
    /// must be the one that takes the command string (`-c` for `script`).
    pub flags: Vec<String>,
    /// Helper's designated output file; output is captured from the pipe.
    pub sink: String,
}

impl Default for PtySection {
    fn default() -> Self {
        Self {
            mode: PtyMode::default(),
            helper: DEFAULT_PTY_HELPER.to_string(),
            flags: vec!["-q".to_string(), "-e".to_string(), "-c".to_string()],
            sink: DEFAULT_PTY_SINK.to_string(),
        }
    }
}

/// Timing knobs for the drain loop and termination path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineTiming {
    /// Upper bound on how long the loop waits for a chunk before re-checking
    /// the deadline and child status.
    pub poll_interval: Duration,
    /// Window between the graceful signal and the forced kill.
    pub grace_period: Duration,
    /// Bound on reading trailing output once the child has exited.
    pub drain_timeout: Duration,
    pub clock: DeadlineClock,
}

impl Default for EngineTiming {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            grace_period: Duration::from_millis(DEFAULT_GRACE_PERIOD_MS),
            drain_timeout: Duration::from_millis(DEFAULT_DRAIN_TIMEOUT_MS),
            clock: DeadlineClock::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PtySettings {
    pub mode: PtyMode,
    pub helper: String,
    pub flags: Vec<String>,
    pub sink: String,
}

/// Validated runner settings.
///
/// Construct via `RunnerSettings::try_from(raw)` (validating) or
/// `RunnerSettings::default()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerSettings {
    pub tool: String,
    pub override_env: String,
    pub default_timeout: Duration,
    pub probe_timeout: Duration,
    pub timing: EngineTiming,
    pub pty: PtySettings,
}

impl RunnerSettings {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        let RawConfigFile { runner, pty } = raw;
        Self {
            tool: runner.tool,
            override_env: runner.override_env,
            default_timeout: Duration::from_secs(runner.default_timeout_secs),
            probe_timeout: Duration::from_millis(runner.probe_timeout_ms),
            timing: EngineTiming {
                poll_interval: Duration::from_millis(runner.poll_interval_ms),
                grace_period: Duration::from_millis(runner.grace_period_ms),
                drain_timeout: Duration::from_millis(runner.drain_timeout_ms),
                clock: runner.clock,
            },
            pty: PtySettings {
                mode: pty.mode,
                helper: pty.helper,
                flags: pty.flags,
                sink: pty.sink,
            },
        }
    }
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self::new_unchecked(RawConfigFile::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let s = RunnerSettings::default();
        assert_eq!(s.tool, "kimi");
        assert_eq!(s.override_env, "KIMI_BIN");
        assert_eq!(s.default_timeout, Duration::from_secs(3600));
        assert_eq!(s.probe_timeout, Duration::from_secs(5));
        assert_eq!(s.timing.grace_period, Duration::from_secs(1));
        assert_eq!(s.timing.clock, DeadlineClock::Monotonic);
        assert_eq!(s.pty.helper, "script");
        assert_eq!(s.pty.flags, vec!["-q", "-e", "-c"]);
        assert_eq!(s.pty.sink, "/dev/null");
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let raw: RawConfigFile = toml::from_str(
            r#"
[runner]
grace_period_ms = 2000
clock = "wall"

[pty]
mode = "never"
"#,
        )
        .unwrap();
        let s = RunnerSettings::try_from(raw).unwrap();
        assert_eq!(s.timing.grace_period, Duration::from_secs(2));
        assert_eq!(s.timing.clock, DeadlineClock::Wall);
        assert_eq!(s.pty.mode, PtyMode::Never);
        assert_eq!(s.tool, "kimi");
        assert_eq!(s.timing.poll_interval, Duration::from_millis(100));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let parsed: std::result::Result<RawConfigFile, _> =
            toml::from_str("[runner]\ntimeout_secs = 5\n");
        assert!(parsed.is_err());
    }
}
