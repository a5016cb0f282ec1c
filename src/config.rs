//! Process-wide tunables for the offer pipeline and the reconciler.
//!
//! Every numeric constant the design calls out by name (queue capacity,
//! decline intervals, reconciler backoff) lives here as a `Config` field
//! with a default equal to the value the design fixes. Loading follows the
//! teacher's pattern of environment-variable overrides layered on
//! `Default::default()`, without pulling in a full config-file framework
//! for a handful of knobs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulerError};

/// `0` denotes an unbounded offer queue (see design note on queue capacity
/// zero: nothing downstream relies on boundedness for back-pressure).
pub const UNBOUNDED_QUEUE: usize = 0;

pub const DEFAULT_SHORT_REFUSE_SECONDS: f64 = 5.0;
pub const DEFAULT_LONG_REFUSE_SECONDS: f64 = 120.0;
pub const DEFAULT_AWAIT_POLL_MS: u64 = 100;
pub const DEFAULT_AWAIT_TIMEOUT_MS: u64 = 5_000;

pub const BASE_BACKOFF_MS: u64 = 4_000;
pub const BACKOFF_MULTIPLIER: u64 = 2;
pub const MAX_BACKOFF_MS: u64 = 30_000;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Offer queue capacity; `0` means unbounded.
    pub offer_queue_capacity: usize,
    /// Refuse-seconds used when declining for a short interval ("retry
    /// soon" / transient failure / queue overflow).
    pub short_refuse_seconds: f64,
    /// Refuse-seconds used when declining for a long interval ("not
    /// interested for a while").
    pub long_refuse_seconds: f64,
    /// Poll cadence for `await_offers_processed`.
    pub await_poll: Duration,
    /// Upper bound for `await_offers_processed` before it raises a fatal
    /// timeout error.
    pub await_timeout: Duration,
    /// Initial reconciler backoff.
    pub base_backoff: Duration,
    /// Multiplier applied to the reconciler backoff after each explicit
    /// reconcile call.
    pub backoff_multiplier: u64,
    /// Reconciler backoff ceiling.
    pub max_backoff: Duration,
    /// When true, the offer processor calls the consumer routine
    /// synchronously from `enqueue` instead of spawning a dedicated
    /// consumer thread. Exists so tests can drive the pipeline
    /// deterministically without sleeping on a background thread.
    pub single_threaded: bool,
    /// When true, fatal errors are returned to the caller instead of
    /// terminating the process. Production wiring should leave this false.
    pub test_mode: bool,
    /// Path prefix artifact URLs are built under.
    pub artifact_base_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            offer_queue_capacity: UNBOUNDED_QUEUE,
            short_refuse_seconds: DEFAULT_SHORT_REFUSE_SECONDS,
            long_refuse_seconds: DEFAULT_LONG_REFUSE_SECONDS,
            await_poll: Duration::from_millis(DEFAULT_AWAIT_POLL_MS),
            await_timeout: Duration::from_millis(DEFAULT_AWAIT_TIMEOUT_MS),
            base_backoff: Duration::from_millis(BASE_BACKOFF_MS),
            backoff_multiplier: BACKOFF_MULTIPLIER,
            max_backoff: Duration::from_millis(MAX_BACKOFF_MS),
            single_threaded: false,
            test_mode: false,
            artifact_base_path: "/v1/artifacts/template".to_string(),
        }
    }
}

impl Config {
    /// Overlays environment-variable overrides on top of the defaults.
    /// Unset or unparsable variables are ignored rather than treated as
    /// errors, except where the resulting config would be nonsensical (see
    /// `validate`).
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(v) = env_usize("SCHEDULER_OFFER_QUEUE_CAPACITY") {
            config.offer_queue_capacity = v;
        }
        if let Some(v) = env_f64("SCHEDULER_SHORT_REFUSE_SECONDS") {
            config.short_refuse_seconds = v;
        }
        if let Some(v) = env_f64("SCHEDULER_LONG_REFUSE_SECONDS") {
            config.long_refuse_seconds = v;
        }
        if let Some(v) = env_u64("SCHEDULER_BASE_BACKOFF_MS") {
            config.base_backoff = Duration::from_millis(v);
        }
        if let Some(v) = env_u64("SCHEDULER_MAX_BACKOFF_MS") {
            config.max_backoff = Duration::from_millis(v);
        }
        if std::env::var("SCHEDULER_SINGLE_THREADED").as_deref() == Ok("1") {
            config.single_threaded = true;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.short_refuse_seconds < 0.0 || self.long_refuse_seconds < 0.0 {
            return Err(SchedulerError::Config(
                "refuse seconds must be non-negative".to_string(),
            ));
        }
        if self.backoff_multiplier == 0 {
            return Err(SchedulerError::Config(
                "backoff multiplier must be at least 1".to_string(),
            ));
        }
        if self.base_backoff > self.max_backoff {
            return Err(SchedulerError::Config(
                "base backoff cannot exceed max backoff".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

fn env_f64(key: &str) -> Option<f64> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_design_constants() {
        let config = Config::default();
        assert_eq!(config.offer_queue_capacity, UNBOUNDED_QUEUE);
        assert_eq!(config.base_backoff, Duration::from_millis(BASE_BACKOFF_MS));
        assert_eq!(config.max_backoff, Duration::from_millis(MAX_BACKOFF_MS));
        assert_eq!(config.backoff_multiplier, BACKOFF_MULTIPLIER);
    }

    #[test]
    fn rejects_base_backoff_above_max() {
        let mut config = Config::default();
        config.base_backoff = Duration::from_secs(60);
        config.max_backoff = Duration::from_secs(30);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_multiplier() {
        let mut config = Config::default();
        config.backoff_multiplier = 0;
        assert!(config.validate().is_err());
    }
}
