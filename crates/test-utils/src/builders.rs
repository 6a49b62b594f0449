#![allow(dead_code)]

use std::time::Duration;

use kimi_run::config::RunnerSettings;
use kimi_run::types::{DeadlineClock, PtyMode};

/// Builder for `RunnerSettings` with test-friendly timings.
///
/// Defaults: short poll/grace/drain windows and no terminal wrapping, so
/// tests run fast and launch exactly the command they configure.
pub struct SettingsBuilder {
    settings: RunnerSettings,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        let mut settings = RunnerSettings::default();
        settings.probe_timeout = Duration::from_secs(2);
        settings.timing.poll_interval = Duration::from_millis(10);
        settings.timing.grace_period = Duration::from_millis(200);
        settings.timing.drain_timeout = Duration::from_millis(100);
        settings.pty.mode = PtyMode::Never;
        Self { settings }
    }

    pub fn tool(mut self, name: &str) -> Self {
        self.settings.tool = name.to_string();
        self
    }

    pub fn override_env(mut self, var: &str) -> Self {
        self.settings.override_env = var.to_string();
        self
    }

    pub fn pty_mode(mut self, mode: PtyMode) -> Self {
        self.settings.pty.mode = mode;
        self
    }

    pub fn pty_helper(mut self, helper: &str, flags: &[&str], sink: &str) -> Self {
        self.settings.pty.helper = helper.to_string();
        self.settings.pty.flags = flags.iter().map(|f| f.to_string()).collect();
        self.settings.pty.sink = sink.to_string();
        self
    }

    pub fn grace_period(mut self, grace: Duration) -> Self {
        self.settings.timing.grace_period = grace;
        self
    }

    pub fn poll_interval(mut self, poll: Duration) -> Self {
        self.settings.timing.poll_interval = poll;
        self
    }

    pub fn clock(mut self, clock: DeadlineClock) -> Self {
        self.settings.timing.clock = clock;
        self
    }

    pub fn build(self) -> RunnerSettings {
        self.settings
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
