// src/host/mod.rs

//! Ambient host lookups (environment variables, PATH, file checks) behind a
//! trait, so resolution can be exercised without touching the real process
//! environment.

use std::ffi::OsString;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

pub mod mock;

/// Abstract view of the host the tool would run on.
pub trait HostEnv: Send + Sync + Debug {
    /// Value of an environment variable, if set and valid Unicode.
    fn var(&self, key: &str) -> Option<String>;

    /// Whether `path` names an existing regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// `which`-style lookup of an executable by name on the search path.
    fn find_executable(&self, name: &str) -> Option<PathBuf>;
}

/// Implementation backed by `std::env` and the real filesystem.
#[derive(Debug, Clone, Default)]
pub struct RealHostEnv;

impl HostEnv for RealHostEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn find_executable(&self, name: &str) -> Option<PathBuf> {
        let search_path: Option<OsString> = std::env::var_os("PATH");
        let cwd = std::env::current_dir().ok()?;
        which::which_in(name, search_path, cwd).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_env_finds_sh() {
        #[cfg(unix)]
        {
            let found = RealHostEnv.find_executable("sh");
            assert!(found.is_some());
        }
    }

    #[test]
    fn real_env_misses_nonsense_binary() {
        assert!(
            RealHostEnv
                .find_executable("definitely_not_a_real_tool_kimi_run_xyz")
                .is_none()
        );
    }
}
