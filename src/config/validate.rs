// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{RawConfigFile, RunnerSettings};
use crate::errors::{KimiRunError, Result};

/// Grace periods beyond this turn "bounded wait on kill" into a hang.
const MAX_GRACE_PERIOD: Duration = Duration::from_secs(30);

impl TryFrom<RawConfigFile> for RunnerSettings {
    type Error = KimiRunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(RunnerSettings::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_tool(cfg)?;
    validate_durations(cfg)?;
    validate_pty(cfg)?;
    Ok(())
}

fn validate_tool(cfg: &RawConfigFile) -> Result<()> {
    if cfg.runner.tool.trim().is_empty() {
        return Err(KimiRunError::ConfigError(
            "[runner].tool must not be empty".to_string(),
        ));
    }
    if cfg.runner.override_env.trim().is_empty() || cfg.runner.override_env.contains('=') {
        return Err(KimiRunError::ConfigError(format!(
            "[runner].override_env must be a variable name (got '{}')",
            cfg.runner.override_env
        )));
    }
    Ok(())
}

fn validate_durations(cfg: &RawConfigFile) -> Result<()> {
    let r = &cfg.runner;
    for (key, value) in [
        ("default_timeout_secs", r.default_timeout_secs),
        ("probe_timeout_ms", r.probe_timeout_ms),
        ("poll_interval_ms", r.poll_interval_ms),
        ("grace_period_ms", r.grace_period_ms),
        ("drain_timeout_ms", r.drain_timeout_ms),
    ] {
        if value == 0 {
            return Err(KimiRunError::ConfigError(format!(
                "[runner].{key} must be >= 1 (got 0)"
            )));
        }
    }

    if Duration::from_millis(r.grace_period_ms) > MAX_GRACE_PERIOD {
        return Err(KimiRunError::ConfigError(format!(
            "[runner].grace_period_ms must be <= {} (got {})",
            MAX_GRACE_PERIOD.as_millis(),
            r.grace_period_ms
        )));
    }

    Ok(())
}

fn validate_pty(cfg: &RawConfigFile) -> Result<()> {
    if cfg.pty.helper.trim().is_empty() {
        return Err(KimiRunError::ConfigError(
            "[pty].helper must not be empty".to_string(),
        ));
    }
    Ok(())
}
