//! Readiness poller
//!
//! Owns two timer-driven tasks over one shared snapshot:
//! - the probe loop, which calls the [`HealthProbe`] every `interval` until it
//!   reports alive, then flips the state to Ready and fires the callback after
//!   `settle_delay`
//! - the progress loop, which animates the progress value while still polling
//!   and exits as soon as the state leaves Polling
//!
//! The snapshot lives in a `tokio::sync::watch` channel. Every write goes
//! through `send_modify`/`send_if_modified`, so the Ready transition (state and
//! progress = 100) is a single atomic update and the progress loop can never
//! write after it.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use super::config::PollerConfig;
use super::probe::HealthProbe;
use super::progress::{ProgressMeter, ProgressStage};

/// Lifecycle of one poller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessState {
    /// Still waiting for the first healthy probe
    Polling,
    /// The service answered; terminal
    Ready,
    /// `max_attempts` ran out; terminal, only reachable with a bounded policy
    Exhausted,
}

impl fmt::Display for ReadinessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadinessState::Polling => write!(f, "polling"),
            ReadinessState::Ready => write!(f, "ready"),
            ReadinessState::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// Point-in-time view of a poller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadinessSnapshot {
    pub state: ReadinessState,
    /// 0..=100, non-decreasing, 100 only once Ready
    pub progress: f64,
    /// Probes started so far
    pub attempts: u32,
    /// Time from start to the first healthy probe
    pub ready_after: Option<Duration>,
}

impl ReadinessSnapshot {
    fn initial() -> Self {
        Self {
            state: ReadinessState::Polling,
            progress: 0.0,
            attempts: 0,
            ready_after: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state == ReadinessState::Ready
    }

    pub fn stage(&self) -> ProgressStage {
        ProgressStage::from_progress(self.progress)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadinessError {
    #[error("Poller already started")]
    AlreadyStarted,

    #[error("Poller not started")]
    NotStarted,

    #[error("Service not ready after {attempts} attempts")]
    Exhausted { attempts: u32 },

    #[error("Poller stopped before the service became ready")]
    Stopped,
}

struct PollerTasks {
    probe: JoinHandle<()>,
    progress: JoinHandle<()>,
}

impl PollerTasks {
    fn abort(&self) {
        self.probe.abort();
        self.progress.abort();
    }
}

/// Waits for a cold-starting service to come up
///
/// A poller runs once: [`start`](Self::start) spawns both loops on the current
/// tokio runtime, [`stop`](Self::stop) (or dropping the poller) aborts them.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use roaster::client::RoastClient;
/// use roaster::readiness::{PollerConfig, ReadinessPoller};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RoastClient::new("https://roast-my-startup-api.onrender.com")?;
/// let mut poller = ReadinessPoller::new(Arc::new(client), PollerConfig::default());
/// poller.start(|| println!("ready"))?;
/// poller.wait_ready().await?;
/// # Ok(())
/// # }
/// ```
pub struct ReadinessPoller {
    probe: Arc<dyn HealthProbe>,
    config: PollerConfig,
    /// Moved into the tasks on start
    sender: Option<watch::Sender<ReadinessSnapshot>>,
    receiver: watch::Receiver<ReadinessSnapshot>,
    tasks: Option<PollerTasks>,
}

impl ReadinessPoller {
    pub fn new(probe: Arc<dyn HealthProbe>, config: PollerConfig) -> Self {
        let (sender, receiver) = watch::channel(ReadinessSnapshot::initial());
        Self {
            probe,
            config,
            sender: Some(sender),
            receiver,
            tasks: None,
        }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Spawn the probe and progress loops
    ///
    /// `on_ready` runs at most once, `settle_delay` after the first healthy
    /// probe. Must be called from within a tokio runtime.
    pub fn start<F>(&mut self, on_ready: F) -> Result<(), ReadinessError>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = Arc::new(self.sender.take().ok_or(ReadinessError::AlreadyStarted)?);

        let rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let meter = ProgressMeter::new(self.config.progress.clone());

        debug!(
            interval_ms = self.config.interval.as_millis() as u64,
            max_attempts = ?self.config.max_attempts,
            "Starting readiness poller"
        );

        let probe = tokio::spawn(probe_loop(
            self.probe.clone(),
            self.config.clone(),
            sender.clone(),
            on_ready,
        ));
        let progress = tokio::spawn(progress_loop(meter, rng, sender));

        self.tasks = Some(PollerTasks { probe, progress });
        Ok(())
    }

    /// Abort both loops; the ready callback will not fire if it has not yet
    pub fn stop(&mut self) {
        if let Some(tasks) = self.tasks.take() {
            tasks.abort();
            debug!("Readiness poller stopped");
        }
    }

    pub fn snapshot(&self) -> ReadinessSnapshot {
        *self.receiver.borrow()
    }

    /// Watch snapshot updates
    pub fn subscribe(&self) -> watch::Receiver<ReadinessSnapshot> {
        self.receiver.clone()
    }

    /// Resolve on the Ready transition
    ///
    /// Returns as soon as the state flips, which is `settle_delay` before the
    /// ready callback runs.
    pub async fn wait_ready(&self) -> Result<(), ReadinessError> {
        if self.sender.is_some() {
            return Err(ReadinessError::NotStarted);
        }

        let mut receiver = self.receiver.clone();
        let snapshot = match receiver
            .wait_for(|s| s.state != ReadinessState::Polling)
            .await
        {
            Ok(snapshot) => *snapshot,
            Err(_) => return Err(ReadinessError::Stopped),
        };

        if snapshot.is_ready() {
            Ok(())
        } else {
            Err(ReadinessError::Exhausted {
                attempts: snapshot.attempts,
            })
        }
    }
}

impl Drop for ReadinessPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn probe_loop<F>(
    probe: Arc<dyn HealthProbe>,
    config: PollerConfig,
    sender: Arc<watch::Sender<ReadinessSnapshot>>,
    on_ready: F,
) where
    F: FnOnce() + Send + 'static,
{
    let started = Instant::now();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        sender.send_modify(|s| s.attempts = attempts);

        match probe.probe().await {
            Ok(()) => break,
            Err(reason) => debug!(attempt = attempts, reason = %reason, "Service not ready yet"),
        }

        if let Some(max_attempts) = config.max_attempts {
            if attempts >= max_attempts {
                sender.send_modify(|s| s.state = ReadinessState::Exhausted);
                warn!(attempts, "Service did not become ready, giving up");
                return;
            }
        }

        sleep(config.interval).await;
    }

    let ready_after = started.elapsed();
    sender.send_modify(|s| {
        s.state = ReadinessState::Ready;
        s.progress = 100.0;
        s.ready_after = Some(ready_after);
    });
    info!(
        attempts,
        ready_after_ms = ready_after.as_millis() as u64,
        "Service is ready"
    );

    sleep(config.settle_delay).await;
    on_ready();
}

async fn progress_loop(
    mut meter: ProgressMeter,
    mut rng: StdRng,
    sender: Arc<watch::Sender<ReadinessSnapshot>>,
) {
    let finished = settled(sender.subscribe());
    tokio::pin!(finished);

    while let Some(cadence) = meter.cadence() {
        tokio::select! {
            _ = sleep(cadence) => {}
            _ = &mut finished => return,
        }
        let next = meter.advance(&mut rng);

        let mut polling = true;
        sender.send_if_modified(|s| {
            polling = s.state == ReadinessState::Polling;
            if polling {
                s.progress = next;
            }
            polling
        });

        if !polling {
            return;
        }
    }

    debug!(progress = meter.value(), "Progress stalled, waiting for service");
}

/// Resolves once the state leaves Polling
async fn settled(mut updates: watch::Receiver<ReadinessSnapshot>) {
    let _ = updates
        .wait_for(|s| s.state != ReadinessState::Polling)
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readiness::ProbeNotReady;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails `failures` times, then reports alive
    struct FlakyProbe {
        failures: u32,
        calls: AtomicU32,
    }

    impl FlakyProbe {
        fn new(failures: u32) -> Arc<Self> {
            Arc::new(Self {
                failures,
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HealthProbe for FlakyProbe {
        async fn probe(&self) -> Result<(), ProbeNotReady> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(ProbeNotReady::Status(503))
            } else {
                Ok(())
            }
        }
    }

    fn config() -> PollerConfig {
        PollerConfig::default().with_seed(42)
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_after_failures() {
        let probe = FlakyProbe::new(4);
        let fired = Arc::new(AtomicU32::new(0));

        let mut poller = ReadinessPoller::new(probe.clone(), config());
        let counter = fired.clone();
        poller
            .start(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        poller.wait_ready().await.unwrap();

        let snapshot = poller.snapshot();
        assert_eq!(snapshot.state, ReadinessState::Ready);
        assert_eq!(snapshot.attempts, 5);
        assert_eq!(snapshot.progress, 100.0);
        assert_eq!(snapshot.ready_after, Some(Duration::from_secs(8)));
        assert_eq!(probe.calls(), 5);

        sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(probe.calls(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_callback_waits_for_settle_delay() {
        let fired = Arc::new(AtomicU32::new(0));
        let mut poller = ReadinessPoller::new(FlakyProbe::new(1), config());
        let counter = fired.clone();
        poller
            .start(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        poller.wait_ready().await.unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(299)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_invariants() {
        let mut poller = ReadinessPoller::new(FlakyProbe::new(20), config());
        let mut updates = poller.subscribe();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let recorder = {
            let seen = seen.clone();
            tokio::spawn(async move {
                while updates.changed().await.is_ok() {
                    let snapshot = *updates.borrow_and_update();
                    seen.lock().push(snapshot);
                }
            })
        };

        poller.start(|| {}).unwrap();
        poller.wait_ready().await.unwrap();
        sleep(Duration::from_secs(1)).await;
        drop(poller);
        recorder.await.unwrap();

        let seen = seen.lock();
        assert!(!seen.is_empty());

        let mut prev = 0.0;
        let mut reached_slow = false;
        for snapshot in seen.iter() {
            assert!(snapshot.progress >= prev, "progress went backwards");
            prev = snapshot.progress;

            match snapshot.state {
                ReadinessState::Polling => {
                    assert!(snapshot.progress < 100.0);
                    if !reached_slow {
                        assert!(snapshot.progress <= 90.0);
                    }
                    reached_slow |= snapshot.progress >= 90.0;
                }
                ReadinessState::Ready => assert_eq!(snapshot.progress, 100.0),
                ReadinessState::Exhausted => panic!("unexpected exhaustion"),
            }
        }
        assert!(reached_slow, "40s of polling should reach the slow phase");
        assert_eq!(seen.last().map(|s| s.state), Some(ReadinessState::Ready));
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_attempts_exhausts() {
        let probe = FlakyProbe::new(u32::MAX);
        let fired = Arc::new(AtomicU32::new(0));
        let mut poller = ReadinessPoller::new(probe.clone(), config().with_max_attempts(3));
        let counter = fired.clone();
        poller
            .start(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        let err = poller.wait_ready().await.unwrap_err();
        assert_eq!(err, ReadinessError::Exhausted { attempts: 3 });

        sleep(Duration::from_secs(30)).await;
        assert_eq!(probe.calls(), 3);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(poller.snapshot().progress < 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_both_loops() {
        let probe = FlakyProbe::new(u32::MAX);
        let mut poller = ReadinessPoller::new(probe.clone(), config());
        poller.start(|| {}).unwrap();

        sleep(Duration::from_secs(5)).await;
        poller.stop();
        let calls = probe.calls();
        let progress = poller.snapshot().progress;

        assert_eq!(poller.wait_ready().await, Err(ReadinessError::Stopped));

        sleep(Duration::from_secs(60)).await;
        assert_eq!(probe.calls(), calls);
        assert_eq!(poller.snapshot().progress, progress);
        assert_eq!(poller.snapshot().state, ReadinessState::Polling);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_releases_progress_loop() {
        // Ready on the second probe, mid fast phase
        let mut poller = ReadinessPoller::new(FlakyProbe::new(1), config());
        poller.start(|| {}).unwrap();
        poller.wait_ready().await.unwrap();

        // Well short of the next 300ms tick
        sleep(Duration::from_millis(1)).await;
        let tasks = poller.tasks.as_ref().unwrap();
        assert!(tasks.progress.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_releases_progress_loop() {
        let config = config().with_max_attempts(2);
        let mut poller = ReadinessPoller::new(FlakyProbe::new(u32::MAX), config);
        poller.start(|| {}).unwrap();
        assert!(poller.wait_ready().await.is_err());

        sleep(Duration::from_millis(1)).await;
        let tasks = poller.tasks.as_ref().unwrap();
        assert!(tasks.probe.is_finished());
        assert!(tasks.progress.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_once() {
        let mut poller = ReadinessPoller::new(FlakyProbe::new(0), config());
        assert_eq!(poller.wait_ready().await, Err(ReadinessError::NotStarted));

        poller.start(|| {}).unwrap();
        assert_eq!(poller.start(|| {}), Err(ReadinessError::AlreadyStarted));
        poller.wait_ready().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediately_ready() {
        let mut poller = ReadinessPoller::new(FlakyProbe::new(0), config());
        poller.start(|| {}).unwrap();
        poller.wait_ready().await.unwrap();

        let snapshot = poller.snapshot();
        assert_eq!(snapshot.attempts, 1);
        assert_eq!(snapshot.ready_after, Some(Duration::ZERO));
        assert_eq!(snapshot.stage(), ProgressStage::Ready);
    }
}
