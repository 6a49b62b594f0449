// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{RawConfigFile, RunnerSettings};
use crate::errors::Result;

/// Variable naming a settings file when `--config` is not given.
pub const CONFIG_ENV: &str = "KIMI_RUN_CONFIG";

/// Load a settings file and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] for the
/// semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a settings file from path and validate it into `RunnerSettings`.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<RunnerSettings> {
    let raw = load_from_path(&path)?;
    RunnerSettings::try_from(raw)
}

/// Pick the settings file: explicit CLI path first, then `KIMI_RUN_CONFIG`.
pub fn settings_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    cli_path.map(Path::to_path_buf).or_else(|| {
        std::env::var_os(CONFIG_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    })
}

/// Load settings from `path`, or fall back to built-in defaults.
pub fn load_settings(path: Option<&Path>) -> Result<RunnerSettings> {
    match path {
        Some(p) => load_and_validate(p),
        None => Ok(RunnerSettings::default()),
    }
}
