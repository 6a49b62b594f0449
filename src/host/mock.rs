// src/host/mock.rs

use super::HostEnv;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// In-memory [`HostEnv`] for tests.
///
/// Variables, files and PATH entries are all explicit; nothing leaks in from
/// the real process environment. Lookups are counted so tests can assert
/// that probing happened (or did not).
#[derive(Debug, Clone, Default)]
pub struct MockHostEnv {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Debug, Default)]
struct MockState {
    vars: HashMap<String, String>,
    files: HashSet<PathBuf>,
    on_path: HashMap<String, PathBuf>,
    lookups: Vec<String>,
}

impl MockHostEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_var(&self, key: impl Into<String>, value: impl Into<String>) -> &Self {
        let mut state = self.inner.lock().unwrap();
        state.vars.insert(key.into(), value.into());
        self
    }

    pub fn add_file(&self, path: impl AsRef<Path>) -> &Self {
        let mut state = self.inner.lock().unwrap();
        state.files.insert(path.as_ref().to_path_buf());
        self
    }

    /// Make `name` resolvable on the search path at `path` (also registered
    /// as a file).
    pub fn add_executable(&self, name: impl Into<String>, path: impl AsRef<Path>) -> &Self {
        let mut state = self.inner.lock().unwrap();
        let path = path.as_ref().to_path_buf();
        state.files.insert(path.clone());
        state.on_path.insert(name.into(), path);
        self
    }

    /// Names passed to `find_executable`, in call order.
    pub fn lookups(&self) -> Vec<String> {
        self.inner.lock().unwrap().lookups.clone()
    }
}

impl HostEnv for MockHostEnv {
    fn var(&self, key: &str) -> Option<String> {
        let state = self.inner.lock().unwrap();
        state.vars.get(key).cloned()
    }

    fn is_file(&self, path: &Path) -> bool {
        let state = self.inner.lock().unwrap();
        state.files.contains(path)
    }

    fn find_executable(&self, name: &str) -> Option<PathBuf> {
        let mut state = self.inner.lock().unwrap();
        state.lookups.push(name.to_string());
        state.on_path.get(name).cloned()
    }
}
