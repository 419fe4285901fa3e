//! Cold-start readiness
//!
//! The roast service sleeps when idle and takes a while to wake up. This
//! module waits for it: a [`ReadinessPoller`] probes `GET /health` until the
//! service reports `alive`, while animating a progress value the caller can
//! display.
//!
//! ## Policy
//!
//! Failed probes are never surfaced. By default the poller retries forever
//! because callers have no fallback; set [`PollerConfig::max_attempts`] to
//! bound it.

mod config;
mod poller;
mod probe;
mod progress;

pub use config::{PollerConfig, ProgressSchedule, StepRange};
pub use poller::{ReadinessError, ReadinessPoller, ReadinessSnapshot, ReadinessState};
pub use probe::{HealthProbe, ProbeNotReady};
pub use progress::{ProgressMeter, ProgressPhase, ProgressStage};
