//! Unified error hierarchy for the scheduler core.
//!
//! Mirrors the distinction the design draws between recoverable failures
//! (logged and handled inline — never surfaced as a hard error to a driver
//! callback) and structural/fatal failures (logged and followed by process
//! termination, since a scheduler that can't trust its own state is worse
//! than one that restarts).

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("client evaluation failed: {0}")]
    ClientEvaluation(String),

    #[error("driver handle used before registration")]
    DriverNotRegistered,

    #[error("persistence layer failed to initialize: {0}")]
    PersistenceInit(String),

    #[error("timed out waiting for in-flight offers to drain")]
    AwaitTimeout,

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Whether a failure is recoverable (log + decline + continue) or
/// structural (crash fast). Only `ClientEvaluation`, `DriverNotRegistered`,
/// `PersistenceInit` and `AwaitTimeout` are fatal; the rest are handled
/// inline by the offer pipeline and never reach this classification in
/// practice.
impl SchedulerError {
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SchedulerError::ClientEvaluation(_)
                | SchedulerError::DriverNotRegistered
                | SchedulerError::PersistenceInit(_)
                | SchedulerError::AwaitTimeout
        )
    }
}

/// Logs a fatal error and terminates the process, unless the crate was
/// built/configured for test mode, in which case the error is returned
/// instead so tests can assert on it without killing the test binary.
///
/// This is the Rust shape of the design's "log and force process exit"
/// requirement for client evaluation failures: there is no supervisor that
/// would otherwise notice a consumer thread silently wedged on a poisoned
/// state.
pub fn fatal<T>(err: SchedulerError, test_mode: bool) -> Result<T> {
    tracing::error!(error = %err, "fatal scheduler error");
    if test_mode {
        return Err(err);
    }
    std::process::exit(1);
}
