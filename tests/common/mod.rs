// tests/common/mod.rs

#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use kimi_run::config::ExecutionConfig;
use kimi_run::host::mock::MockHostEnv;

pub use kimi_run_test_utils::{
    FakeBackend, FakeScript, SettingsBuilder, SharedBuffer, SignalEvent, init_tracing,
    with_timeout,
};

pub const KIMI_PATH: &str = "/opt/kimi/bin/kimi";

/// Host where `kimi` is on PATH and nothing else is installed.
pub fn host_with_kimi() -> MockHostEnv {
    let host = MockHostEnv::new();
    host.add_executable("kimi", KIMI_PATH);
    host
}

pub fn config(prompt: &str, workdir: &Path, timeout: Duration) -> ExecutionConfig {
    ExecutionConfig::builder(prompt)
        .workdir(workdir)
        .timeout(timeout)
        .build()
        .expect("valid execution config")
}
