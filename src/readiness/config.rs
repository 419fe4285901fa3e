//! Poller configuration
//!
//! Every timing constant of the poller lives here so that a bounded retry
//! policy or a different animation can be injected without touching callers.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Inclusive-exclusive range `[min, max)` a progress step is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepRange {
    pub min: f64,
    pub max: f64,
}

impl StepRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Draw one step; a degenerate range always yields `min`
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.max > self.min {
            rng.random_range(self.min..self.max)
        } else {
            self.min
        }
    }

    pub fn is_valid(&self) -> bool {
        self.min > 0.0 && self.min <= self.max && self.max.is_finite()
    }
}

/// Two-phase progress animation
///
/// The fast phase runs from 0 up to `fast_ceiling`; the slow phase crawls from
/// there to `slow_ceiling` and then stalls until the service answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressSchedule {
    #[serde(with = "humantime_serde")]
    pub fast_cadence: Duration,
    pub fast_ceiling: f64,
    pub fast_step: StepRange,

    #[serde(with = "humantime_serde")]
    pub slow_cadence: Duration,
    pub slow_ceiling: f64,
    pub slow_step: StepRange,
}

impl Default for ProgressSchedule {
    fn default() -> Self {
        Self {
            fast_cadence: Duration::from_millis(300),
            fast_ceiling: 90.0,
            fast_step: StepRange::new(5.0, 13.0),
            slow_cadence: Duration::from_millis(1500),
            slow_ceiling: 99.0,
            slow_step: StepRange::new(0.2, 0.7),
        }
    }
}

impl ProgressSchedule {
    /// Describe the first problem found, if any
    pub fn check(&self) -> Result<(), String> {
        if self.fast_cadence.is_zero() || self.slow_cadence.is_zero() {
            return Err("progress cadences must be non-zero".to_string());
        }
        if !(self.fast_ceiling > 0.0
            && self.fast_ceiling <= self.slow_ceiling
            && self.slow_ceiling < 100.0)
        {
            return Err(format!(
                "progress ceilings must satisfy 0 < fast ({}) <= slow ({}) < 100",
                self.fast_ceiling, self.slow_ceiling
            ));
        }
        if !self.fast_step.is_valid() || !self.slow_step.is_valid() {
            return Err("progress step ranges must satisfy 0 < min <= max".to_string());
        }
        Ok(())
    }
}

/// Readiness poller settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Delay between health probes
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// Give up after this many probes (None = poll forever)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,

    /// Pause between the ready transition and the ready callback
    #[serde(with = "humantime_serde")]
    pub settle_delay: Duration,

    pub progress: ProgressSchedule,

    /// Seed for the progress animation (None = OS entropy)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: None,
            settle_delay: Duration::from_millis(300),
            progress: ProgressSchedule::default(),
            seed: None,
        }
    }
}

impl PollerConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Describe the first problem found, if any
    pub fn check(&self) -> Result<(), String> {
        if self.interval.is_zero() {
            return Err("readiness interval must be non-zero".to_string());
        }
        if self.max_attempts == Some(0) {
            return Err("max_attempts must be at least 1 when set".to_string());
        }
        self.progress.check()
    }
}
