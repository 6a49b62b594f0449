pub mod builders;
pub mod fake_backend;
pub mod shared_buffer;

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt};

pub use builders::SettingsBuilder;
pub use fake_backend::{FakeBackend, FakeExit, FakeScript, SignalEvent, SpawnRecord};
pub use shared_buffer::SharedBuffer;

static INIT: Once = Once::new();

/// Install a test subscriber once per test binary.
///
/// Output goes through the harness capture, so supervisor logs only show up
/// for failing tests. `RUST_LOG=kimi_run=debug` raises the level.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Fail the test if `f` has not finished within 10 seconds.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(10), f)
        .await
        .expect("Test timed out after 10 seconds")
}
