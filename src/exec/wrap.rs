// src/exec/wrap.rs

//! Pseudo-terminal wrapping.
//!
//! Some tools behave differently (or hang) without a controlling terminal.
//! When a terminal-allocation helper such as `script` is available, the tool
//! is run as `[helper, flags..., <quoted command>, <sink>]`. The helper's own
//! transcript goes to `sink` (`/dev/null`); the terminal output still reaches
//! us through the capture pipe.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::config::{PtySettings, RunnerSettings};
use crate::errors::{KimiRunError, Result};
use crate::exec::command::ResolvedCommand;
use crate::exec::resolve::probe_executable;
use crate::host::HostEnv;
use crate::types::PtyMode;

/// Join `argv` into one POSIX `sh` command string.
///
/// Escaping contract: every element becomes exactly one shell word whose
/// value is the element's literal text. Quotes, `;`, `$()`, backticks,
/// globs and whitespace are never interpreted. Elements containing a NUL
/// byte cannot be represented and are rejected with
/// [`KimiRunError::InvalidCommand`].
pub fn quote_command<S: AsRef<str>>(argv: &[S]) -> Result<String> {
    shlex::try_join(argv.iter().map(|s| s.as_ref()))
        .map_err(|e| KimiRunError::InvalidCommand(format!("cannot quote argument: {e}")))
}

/// Decides, once per run, whether the tool is wrapped in the terminal
/// helper.
#[derive(Debug)]
pub struct TerminalWrapDecider {
    host: Arc<dyn HostEnv>,
    pty: PtySettings,
    probe_timeout: Duration,
    helper: OnceCell<Option<PathBuf>>,
}

impl TerminalWrapDecider {
    pub fn new(host: Arc<dyn HostEnv>, settings: &RunnerSettings) -> Self {
        Self {
            host,
            pty: settings.pty.clone(),
            probe_timeout: settings.probe_timeout,
            helper: OnceCell::new(),
        }
    }

    /// Path of the helper binary, probed on first call and cached.
    pub async fn helper(&self) -> Option<&Path> {
        if self.pty.mode == PtyMode::Never {
            return None;
        }

        self.helper
            .get_or_init(|| async {
                let found =
                    probe_executable(Arc::clone(&self.host), &self.pty.helper, self.probe_timeout)
                        .await;
                match &found {
                    Some(path) => info!(helper = %path.display(), "terminal helper available"),
                    None => debug!(helper = %self.pty.helper, "terminal helper not available"),
                }
                found
            })
            .await
            .as_deref()
    }

    pub async fn should_wrap(&self) -> bool {
        self.helper().await.is_some()
    }

    /// Build the wrapped command if the helper is available, otherwise return
    /// `inner` unchanged.
    pub async fn apply(&self, inner: ResolvedCommand) -> Result<ResolvedCommand> {
        match self.helper().await {
            Some(helper) => wrap_with(helper, &self.pty, &inner),
            None => Ok(inner),
        }
    }
}

fn wrap_with(helper: &Path, pty: &PtySettings, inner: &ResolvedCommand) -> Result<ResolvedCommand> {
    let quoted = quote_command(inner.argv())?;

    let mut argv = Vec::with_capacity(pty.flags.len() + 3);
    argv.push(helper.to_string_lossy().into_owned());
    argv.extend(pty.flags.iter().cloned());
    argv.push(quoted);
    argv.push(pty.sink.clone());

    ResolvedCommand::wrapped(argv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::MockHostEnv;

    fn inner() -> ResolvedCommand {
        ResolvedCommand::direct(vec![
            "/usr/bin/kimi".into(),
            "--print".into(),
            "-p".into(),
            "it's a \"test\"; rm -rf $(pwd)".into(),
        ])
        .unwrap()
    }

    #[test]
    fn quoting_keeps_token_boundaries() {
        let argv = ["printf", "%s\n", "a b", "it's", "$(id)", "`id`", "x;y", ""];
        let quoted = quote_command(&argv).unwrap();
        let split = shlex::split(&quoted).unwrap();
        assert_eq!(split, argv);
    }

    #[test]
    fn quoting_rejects_nul() {
        let err = quote_command(&["echo", "a\0b"]).unwrap_err();
        assert!(matches!(err, KimiRunError::InvalidCommand(_)));
    }

    #[tokio::test]
    async fn wraps_when_helper_present() {
        let host = MockHostEnv::new();
        host.add_executable("script", "/usr/bin/script");
        let decider = TerminalWrapDecider::new(Arc::new(host), &RunnerSettings::default());

        let wrapped = decider.apply(inner()).await.unwrap();
        assert!(wrapped.is_wrapped());
        let argv = wrapped.argv();
        assert_eq!(&argv[..4], ["/usr/bin/script", "-q", "-e", "-c"]);
        assert_eq!(argv[5], "/dev/null");
        assert_eq!(shlex::split(&argv[4]).unwrap(), inner().argv());
    }

    #[tokio::test]
    async fn passes_through_without_helper() {
        let decider =
            TerminalWrapDecider::new(Arc::new(MockHostEnv::new()), &RunnerSettings::default());
        assert!(!decider.should_wrap().await);
        assert_eq!(decider.apply(inner()).await.unwrap(), inner());
    }

    #[tokio::test]
    async fn never_mode_skips_probe() {
        let host = MockHostEnv::new();
        host.add_executable("script", "/usr/bin/script");
        let mut settings = RunnerSettings::default();
        settings.pty.mode = PtyMode::Never;

        let decider = TerminalWrapDecider::new(Arc::new(host.clone()), &settings);
        assert!(!decider.should_wrap().await);
        assert!(host.lookups().is_empty());
    }

    #[tokio::test]
    async fn probe_is_cached_per_decider() {
        let host = MockHostEnv::new();
        host.add_executable("script", "/usr/bin/script");
        let decider = TerminalWrapDecider::new(Arc::new(host.clone()), &RunnerSettings::default());

        assert!(decider.should_wrap().await);
        assert!(decider.should_wrap().await);
        assert_eq!(host.lookups(), vec!["script"]);

        let fresh = TerminalWrapDecider::new(Arc::new(host.clone()), &RunnerSettings::default());
        assert!(fresh.should_wrap().await);
        assert_eq!(host.lookups().len(), 2);
    }
}
