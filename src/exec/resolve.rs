// src/exec/resolve.rs

//! Tool binary resolution.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::RunnerSettings;
use crate::host::HostEnv;

/// Where the tool binary was found, if anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The override variable named an existing regular file.
    Override(PathBuf),
    /// Found by searching PATH.
    OnPath(PathBuf),
    NotFound,
}

/// Resolves the tool binary: override variable first, then a bounded PATH
/// probe. A clean miss is `Resolution::NotFound`, never an error.
#[derive(Debug, Clone)]
pub struct CommandResolver {
    host: Arc<dyn HostEnv>,
    tool: String,
    override_env: String,
    probe_timeout: Duration,
}

impl CommandResolver {
    pub fn new(host: Arc<dyn HostEnv>, settings: &RunnerSettings) -> Self {
        Self {
            host,
            tool: settings.tool.clone(),
            override_env: settings.override_env.clone(),
            probe_timeout: settings.probe_timeout,
        }
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn override_env(&self) -> &str {
        &self.override_env
    }

    pub async fn resolve(&self) -> Resolution {
        if let Some(raw) = self
            .host
            .var(&self.override_env)
            .filter(|v| !v.trim().is_empty())
        {
            let candidate = PathBuf::from(raw);
            if self.host.is_file(&candidate) {
                info!(
                    path = %candidate.display(),
                    var = %self.override_env,
                    "using tool override"
                );
                return Resolution::Override(candidate);
            }
            warn!(
                path = %candidate.display(),
                var = %self.override_env,
                "tool override is not an existing file; falling back to PATH"
            );
        }

        match probe_executable(Arc::clone(&self.host), &self.tool, self.probe_timeout).await {
            Some(path) => {
                debug!(tool = %self.tool, path = %path.display(), "tool found on PATH");
                Resolution::OnPath(path)
            }
            None => {
                debug!(tool = %self.tool, "tool not found on PATH");
                Resolution::NotFound
            }
        }
    }
}

/// Look `name` up on the host's search path, giving up after `timeout`.
///
/// The lookup runs on the blocking pool so a stalled filesystem cannot wedge
/// the runtime; a timed-out probe counts as "absent".
pub async fn probe_executable(
    host: Arc<dyn HostEnv>,
    name: &str,
    timeout: Duration,
) -> Option<PathBuf> {
    let owned = name.to_string();
    let lookup = tokio::task::spawn_blocking(move || host.find_executable(&owned));

    match tokio::time::timeout(timeout, lookup).await {
        Ok(Ok(found)) => found,
        Ok(Err(join_err)) => {
            warn!(name, error = %join_err, "executable probe task failed");
            None
        }
        Err(_) => {
            warn!(
                name,
                timeout_ms = timeout.as_millis() as u64,
                "executable probe timed out; treating as absent"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::MockHostEnv;
    use std::path::Path;

    fn resolver(host: &MockHostEnv) -> CommandResolver {
        CommandResolver::new(Arc::new(host.clone()), &RunnerSettings::default())
    }

    #[tokio::test]
    async fn override_to_existing_file_wins() {
        let host = MockHostEnv::new();
        host.set_var("KIMI_BIN", "/opt/kimi/bin/kimi");
        host.add_file("/opt/kimi/bin/kimi");
        host.add_executable("kimi", "/usr/bin/kimi");

        let res = resolver(&host).resolve().await;
        assert_eq!(res, Resolution::Override(PathBuf::from("/opt/kimi/bin/kimi")));
        assert!(host.lookups().is_empty(), "PATH should not be probed");
    }

    #[tokio::test]
    async fn invalid_override_falls_through_to_path() {
        let host = MockHostEnv::new();
        host.set_var("KIMI_BIN", "/nowhere/kimi");
        host.add_executable("kimi", "/usr/local/bin/kimi");

        let res = resolver(&host).resolve().await;
        assert_eq!(res, Resolution::OnPath(PathBuf::from("/usr/local/bin/kimi")));
        assert_eq!(host.lookups(), vec!["kimi"]);
    }

    #[tokio::test]
    async fn blank_override_is_ignored() {
        let host = MockHostEnv::new();
        host.set_var("KIMI_BIN", "   ");

        let res = resolver(&host).resolve().await;
        assert_eq!(res, Resolution::NotFound);
        assert_eq!(host.lookups(), vec!["kimi"]);
    }

    #[tokio::test]
    async fn resolution_is_idempotent() {
        let host = MockHostEnv::new();
        host.add_executable("kimi", "/usr/bin/kimi");
        let r = resolver(&host);

        let first = r.resolve().await;
        let second = r.resolve().await;
        assert_eq!(first, second);
        assert_eq!(first, Resolution::OnPath(PathBuf::from("/usr/bin/kimi")));
    }

    #[derive(Debug)]
    struct StalledHost;

    impl HostEnv for StalledHost {
        fn var(&self, _key: &str) -> Option<String> {
            None
        }

        fn is_file(&self, _path: &Path) -> bool {
            false
        }

        fn find_executable(&self, _name: &str) -> Option<PathBuf> {
            std::thread::sleep(Duration::from_millis(500));
            Some(PathBuf::from("/late/kimi"))
        }
    }

    #[tokio::test]
    async fn stalled_probe_is_bounded() {
        let found =
            probe_executable(Arc::new(StalledHost), "kimi", Duration::from_millis(50)).await;
        assert!(found.is_none());
    }
}
