//! Progress animation
//!
//! True progress towards readiness is unknowable, so the meter tracks elapsed
//! wait time instead: quick random jumps up to the fast ceiling, a slow crawl
//! up to the slow ceiling, then a stall. Only [`ProgressMeter::complete`]
//! takes it to 100.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::config::ProgressSchedule;

/// Where the meter is in its schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    Fast,
    Slow,
    /// Reached the slow ceiling, waiting for the service
    Stalled,
    Complete,
}

#[derive(Debug, Clone)]
pub struct ProgressMeter {
    schedule: ProgressSchedule,
    value: f64,
    complete: bool,
}

impl ProgressMeter {
    pub fn new(schedule: ProgressSchedule) -> Self {
        Self {
            schedule,
            value: 0.0,
            complete: false,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn phase(&self) -> ProgressPhase {
        if self.complete {
            ProgressPhase::Complete
        } else if self.value < self.schedule.fast_ceiling {
            ProgressPhase::Fast
        } else if self.value < self.schedule.slow_ceiling {
            ProgressPhase::Slow
        } else {
            ProgressPhase::Stalled
        }
    }

    /// Delay before the next [`advance`](Self::advance), None once nothing moves
    pub fn cadence(&self) -> Option<Duration> {
        match self.phase() {
            ProgressPhase::Fast => Some(self.schedule.fast_cadence),
            ProgressPhase::Slow => Some(self.schedule.slow_cadence),
            ProgressPhase::Stalled | ProgressPhase::Complete => None,
        }
    }

    /// Take one step in the current phase and return the new value
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) -> f64 {
        match self.phase() {
            ProgressPhase::Fast => {
                let step = self.schedule.fast_step.sample(rng);
                self.value = (self.value + step).min(self.schedule.fast_ceiling);
            }
            ProgressPhase::Slow => {
                let step = self.schedule.slow_step.sample(rng);
                self.value = (self.value + step).min(self.schedule.slow_ceiling);
            }
            ProgressPhase::Stalled | ProgressPhase::Complete => {}
        }
        self.value
    }

    /// Jump to 100
    pub fn complete(&mut self) {
        self.complete = true;
        self.value = 100.0;
    }
}

/// Human-facing label for a progress value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStage {
    Initializing,
    Loading,
    Calibrating,
    AlmostReady,
    Ready,
}

impl ProgressStage {
    pub fn from_progress(progress: f64) -> Self {
        if progress >= 100.0 {
            ProgressStage::Ready
        } else if progress >= 90.0 {
            ProgressStage::AlmostReady
        } else if progress >= 60.0 {
            ProgressStage::Calibrating
        } else if progress >= 30.0 {
            ProgressStage::Loading
        } else {
            ProgressStage::Initializing
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ProgressStage::Initializing => "Initializing roast protocols...",
            ProgressStage::Loading => "Loading brutal honesty module...",
            ProgressStage::Calibrating => "Calibrating sarcasm levels...",
            ProgressStage::AlmostReady => "Almost ready to destroy dreams...",
            ProgressStage::Ready => "Ready to roast!",
        }
    }
}

impl fmt::Display for ProgressStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn meter() -> ProgressMeter {
        ProgressMeter::new(ProgressSchedule::default())
    }

    #[test]
    fn test_fast_phase_steps() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut meter = meter();
        let mut prev = meter.value();

        while meter.phase() == ProgressPhase::Fast {
            let next = meter.advance(&mut rng);
            assert!(next <= 90.0);
            // Either a full 5-13 step or clamped to the ceiling
            let step = next - prev;
            assert!(next == 90.0 || (4.999..13.001).contains(&step), "step {step}");
            prev = next;
        }
        assert_eq!(meter.value(), 90.0);
        assert_eq!(meter.cadence(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_stalls_below_100() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut meter = meter();
        let mut prev = 0.0;

        for _ in 0..10_000 {
            let next = meter.advance(&mut rng);
            assert!(next >= prev);
            assert!(next <= 99.0);
            prev = next;
        }
        assert_eq!(meter.phase(), ProgressPhase::Stalled);
        assert_eq!(meter.value(), 99.0);
        assert_eq!(meter.cadence(), None);
    }

    #[test]
    fn test_complete_jumps_to_100() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut meter = meter();
        meter.advance(&mut rng);
        meter.complete();

        assert_eq!(meter.value(), 100.0);
        assert_eq!(meter.phase(), ProgressPhase::Complete);
        assert_eq!(meter.advance(&mut rng), 100.0);
        assert_eq!(meter.cadence(), None);
    }

    #[test]
    fn test_stage_thresholds() {
        assert_eq!(ProgressStage::from_progress(0.0), ProgressStage::Initializing);
        assert_eq!(ProgressStage::from_progress(29.9), ProgressStage::Initializing);
        assert_eq!(ProgressStage::from_progress(30.0), ProgressStage::Loading);
        assert_eq!(ProgressStage::from_progress(60.0), ProgressStage::Calibrating);
        assert_eq!(ProgressStage::from_progress(90.0), ProgressStage::AlmostReady);
        assert_eq!(ProgressStage::from_progress(99.0), ProgressStage::AlmostReady);
        assert_eq!(ProgressStage::from_progress(100.0), ProgressStage::Ready);
    }
}
