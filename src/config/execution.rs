// src/config/execution.rs

//! Per-run configuration handed to the supervisor by the CLI layer.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::model::DEFAULT_TIMEOUT_SECS;
use crate::errors::{KimiRunError, Result};

/// Immutable description of one supervised run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionConfig {
    prompt: String,
    workdir: PathBuf,
    timeout: Duration,
    allowed_tools: Option<String>,
    meta_file: Option<PathBuf>,
}

impl ExecutionConfig {
    pub fn builder(prompt: impl Into<String>) -> ExecutionConfigBuilder {
        ExecutionConfigBuilder::new(prompt)
    }

    /// Opaque payload passed to the tool.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Working directory as given; see [`ExecutionConfig::prepare_workdir`].
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Comma-separated capability names, passed through verbatim.
    pub fn allowed_tools(&self) -> Option<&str> {
        self.allowed_tools.as_deref()
    }

    /// Metadata file path; carried for callers, not read by the runner.
    pub fn meta_file(&self) -> Option<&Path> {
        self.meta_file.as_deref()
    }

    /// Create the working directory if needed and return its absolute path.
    ///
    /// Fails with [`KimiRunError::Workdir`] when the directory cannot be
    /// created or resolved.
    pub fn prepare_workdir(&self) -> Result<PathBuf> {
        let wrap = |source| KimiRunError::Workdir {
            path: self.workdir.clone(),
            source,
        };
        fs::create_dir_all(&self.workdir).map_err(wrap)?;
        fs::canonicalize(&self.workdir).map_err(wrap)
    }
}

/// Builder for [`ExecutionConfig`].
#[derive(Debug, Clone)]
pub struct ExecutionConfigBuilder {
    prompt: String,
    workdir: PathBuf,
    timeout: Duration,
    allowed_tools: Option<String>,
    meta_file: Option<PathBuf>,
}

impl ExecutionConfigBuilder {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            workdir: PathBuf::from("."),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            allowed_tools: None,
            meta_file: None,
        }
    }

    pub fn workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = dir.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn allowed_tools(mut self, tools: Option<String>) -> Self {
        self.allowed_tools = tools.filter(|t| !t.is_empty());
        self
    }

    pub fn meta_file(mut self, path: Option<PathBuf>) -> Self {
        self.meta_file = path;
        self
    }

    pub fn build(self) -> Result<ExecutionConfig> {
        if self.prompt.trim().is_empty() {
            return Err(KimiRunError::ConfigError(
                "prompt must not be empty".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(KimiRunError::ConfigError(
                "timeout must be positive".to_string(),
            ));
        }
        Ok(ExecutionConfig {
            prompt: self.prompt,
            workdir: self.workdir,
            timeout: self.timeout,
            allowed_tools: self.allowed_tools,
            meta_file: self.meta_file,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_applies_defaults() {
        let cfg = ExecutionConfig::builder("do it").build().unwrap();
        assert_eq!(cfg.workdir(), Path::new("."));
        assert_eq!(cfg.timeout(), Duration::from_secs(3600));
        assert!(cfg.allowed_tools().is_none());
        assert!(cfg.meta_file().is_none());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = ExecutionConfig::builder("x")
            .timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn empty_prompt_is_rejected() {
        assert!(ExecutionConfig::builder("   ").build().is_err());
    }

    #[test]
    fn empty_allow_list_is_dropped() {
        let cfg = ExecutionConfig::builder("x")
            .allowed_tools(Some(String::new()))
            .build()
            .unwrap();
        assert!(cfg.allowed_tools().is_none());
    }

    #[test]
    fn prepare_workdir_creates_and_absolutizes() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("nested/run");
        let cfg = ExecutionConfig::builder("x")
            .workdir(&target)
            .build()
            .unwrap();

        let resolved = cfg.prepare_workdir().unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.is_dir());
        assert_eq!(resolved, fs::canonicalize(&target).unwrap());
    }

    #[test]
    fn prepare_workdir_under_a_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        fs::write(&blocker, b"not a dir").unwrap();

        let cfg = ExecutionConfig::builder("x")
            .workdir(blocker.join("sub"))
            .build()
            .unwrap();

        match cfg.prepare_workdir() {
            Err(KimiRunError::Workdir { path, .. }) => assert_eq!(path, blocker.join("sub")),
            other => panic!("expected Workdir error, got {other:?}"),
        }
    }
}
