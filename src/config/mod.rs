// src/config/mod.rs

//! Runner configuration.
//!
//! - [`model`] holds the on-disk TOML shape (`RawConfigFile`) and the
//!   validated `RunnerSettings` the engine consumes.
//! - [`validate`] performs the semantic checks behind `TryFrom`.
//! - [`loader`] reads the optional settings file.
//! - [`execution`] holds the per-run `ExecutionConfig` built by the CLI.

pub mod execution;
pub mod loader;
pub mod model;
pub mod validate;

pub use execution::{ExecutionConfig, ExecutionConfigBuilder};
pub use loader::{load_and_validate, load_settings, settings_path};
pub use model::{
    EngineTiming, PtySection, PtySettings, RawConfigFile, RunnerSection, RunnerSettings,
};
