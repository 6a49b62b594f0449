// src/engine/deadline.rs

use std::time::{Duration, SystemTime};

use tokio::time::Instant;

use crate::types::DeadlineClock;

/// Absolute end of a run: start + timeout, measured on the configured clock.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    timeout: Duration,
    start: Start,
}

#[derive(Debug, Clone, Copy)]
enum Start {
    Monotonic(Instant),
    Wall(SystemTime),
}

impl Deadline {
    /// Start the clock now.
    pub fn start(clock: DeadlineClock, timeout: Duration) -> Self {
        let start = match clock {
            DeadlineClock::Monotonic => Start::Monotonic(Instant::now()),
            DeadlineClock::Wall => Start::Wall(SystemTime::now()),
        };
        Self { timeout, start }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn elapsed(&self) -> Duration {
        match self.start {
            Start::Monotonic(at) => at.elapsed(),
            // A clock stepped backwards reads as no time elapsed.
            Start::Wall(at) => SystemTime::now()
                .duration_since(at)
                .unwrap_or(Duration::ZERO),
        }
    }

    /// Strictly past the timeout.
    pub fn is_expired(&self) -> bool {
        self.elapsed() > self.timeout
    }

    pub fn remaining(&self) -> Duration {
        self.timeout.saturating_sub(self.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn monotonic_deadline_follows_tokio_time() {
        let d = Deadline::start(DeadlineClock::Monotonic, Duration::from_secs(10));
        assert!(!d.is_expired());

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(!d.is_expired(), "exactly at the timeout is not yet expired");
        assert_eq!(d.remaining(), Duration::ZERO);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(d.is_expired());
    }

    #[tokio::test]
    async fn wall_deadline_expires() {
        let d = Deadline::start(DeadlineClock::Wall, Duration::from_millis(20));
        assert!(!d.is_expired());
        std::thread::sleep(Duration::from_millis(40));
        assert!(d.is_expired());
        assert_eq!(d.remaining(), Duration::ZERO);
    }
}
