// src/types.rs

//! Exit-code contract and the classified outcome of a supervised run.

use std::time::Duration;

use serde::Deserialize;

/// Child exited successfully.
pub const EXIT_SUCCESS: i32 = 0;
/// Unclassified internal error.
pub const EXIT_INTERNAL_ERROR: i32 = 1;
/// Deadline exceeded.
pub const EXIT_TIMEOUT: i32 = 124;
/// Tool binary not found or failed to start.
pub const EXIT_NOT_FOUND: i32 = 127;
/// Interrupted by the caller/operator.
pub const EXIT_INTERRUPTED: i32 = 130;

/// How a running child was brought down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The child exited within the grace window after the graceful signal.
    Graceful,
    /// The child ignored the graceful signal and was force-killed.
    Forced,
}

/// Classified result of one supervised run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The child ran to completion. `code` may be nonzero; that is a result,
    /// not an error of the supervisor.
    Exited { code: i32 },
    TimedOut {
        timeout: Duration,
        termination: Termination,
    },
    Interrupted { termination: Termination },
    /// Resolution failed or the executable could not be started.
    NotFound { reason: String },
    /// Orchestration failure unrelated to the child's own behaviour.
    Internal { message: String },
}

impl Outcome {
    /// Map the outcome onto the process exit-code contract.
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Exited { code } => *code,
            Outcome::TimedOut { .. } => EXIT_TIMEOUT,
            Outcome::Interrupted { .. } => EXIT_INTERRUPTED,
            Outcome::NotFound { .. } => EXIT_NOT_FOUND,
            Outcome::Internal { .. } => EXIT_INTERNAL_ERROR,
        }
    }

    pub fn termination(&self) -> Option<Termination> {
        match self {
            Outcome::TimedOut { termination, .. } | Outcome::Interrupted { termination } => {
                Some(*termination)
            }
            _ => None,
        }
    }
}

/// Clock used to measure the run deadline.
///
/// - `Monotonic`: immune to system clock adjustments (default).
/// - `Wall`: measures against `SystemTime`, matching runners that compare
///   wall-clock timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeadlineClock {
    #[default]
    Monotonic,
    Wall,
}


/// Whether the tool is run attached to a pseudo-terminal helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PtyMode {
    /// Wrap when the helper binary is available.
    #[default]
    Auto,
    /// Never wrap; run the tool directly on the capture pipe.
    Never,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_contract() {
        assert_eq!(Outcome::Exited { code: 0 }.exit_code(), 0);
        assert_eq!(Outcome::Exited { code: 3 }.exit_code(), 3);
        assert_eq!(
            Outcome::TimedOut {
                timeout: Duration::from_secs(1),
                termination: Termination::Graceful
            }
            .exit_code(),
            124
        );
        assert_eq!(
            Outcome::Interrupted {
                termination: Termination::Forced
            }
            .exit_code(),
            130
        );
        assert_eq!(
            Outcome::NotFound {
                reason: "missing".into()
            }
            .exit_code(),
            127
        );
        assert_eq!(
            Outcome::Internal {
                message: "boom".into()
            }
            .exit_code(),
            1
        );
    }
}
