//! End-to-end readiness polling against scripted probes and transports

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use roaster::client::{HttpResponse, RoastClient};
use roaster::readiness::{
    PollerConfig, ProgressMeter, ProgressPhase, ProgressSchedule, ReadinessError,
    ReadinessPoller, ReadinessState,
};
use roaster_testkit::mock::{MockProbe, MockTransport, health_body};
use roaster_testkit::random::pseudo_generators;

/// Start a poller whose callback flips the returned flag
fn start(poller: &mut ReadinessPoller) -> Arc<AtomicBool> {
    let fired = Arc::new(AtomicBool::new(false));
    let flag = fired.clone();
    poller
        .start(move || flag.store(true, Ordering::SeqCst))
        .unwrap();
    fired
}

#[tokio::test(start_paused = true)]
async fn test_ready_after_cold_start() {
    let probe = MockProbe::failing(3);
    let mut poller = ReadinessPoller::new(probe.clone(), PollerConfig::default().with_seed(1));
    let fired = start(&mut poller);

    poller.wait_ready().await.unwrap();

    let snapshot = poller.snapshot();
    assert_eq!(snapshot.state, ReadinessState::Ready);
    assert_eq!(snapshot.progress, 100.0);
    assert_eq!(snapshot.attempts, 4);
    assert_eq!(snapshot.ready_after, Some(Duration::from_secs(6)));
    assert_eq!(probe.calls(), 4);

    // Callback waits out the settle delay
    assert!(!fired.load(Ordering::SeqCst));
    tokio::time::sleep(Duration::from_millis(301)).await;
    assert!(fired.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn test_probes_through_roast_client() {
    let transport = MockTransport::new()
        .fail("/health", "connection refused")
        .respond("/health", HttpResponse::new(502, "Bad Gateway"))
        .respond("/health", HttpResponse::new(200, health_body("starting")))
        .otherwise("/health", HttpResponse::new(200, health_body("alive")))
        .shared();
    let client = RoastClient::with_transport("http://localhost:8000", transport.clone()).unwrap();

    let mut poller = ReadinessPoller::new(Arc::new(client), PollerConfig::default().with_seed(2));
    start(&mut poller);
    poller.wait_ready().await.unwrap();

    assert_eq!(poller.snapshot().attempts, 4);
    let requests = transport.requests_to("/health");
    assert_eq!(requests.len(), 4);
    assert!(requests.iter().all(|r| r.method == "GET"));
}

#[tokio::test(start_paused = true)]
async fn test_progress_invariants_across_seeds() {
    for mut rng in pseudo_generators(7, 5) {
        let config = PollerConfig::default().with_seed(rng.random_u64());
        let failures = rng.random_range(0..40) as u32;

        let mut poller = ReadinessPoller::new(MockProbe::failing(failures), config);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let mut updates = poller.subscribe();
        let recorder = {
            let seen = seen.clone();
            tokio::spawn(async move {
                while updates.changed().await.is_ok() {
                    let snapshot = *updates.borrow_and_update();
                    seen.lock().push(snapshot);
                    if snapshot.state != ReadinessState::Polling {
                        break;
                    }
                }
            })
        };

        start(&mut poller);
        poller.wait_ready().await.unwrap();
        recorder.await.unwrap();

        let seen = seen.lock();
        let mut last = 0.0;
        for snapshot in seen.iter() {
            assert!(snapshot.progress >= last, "seed {}: progress went backwards", rng.seed());
            if snapshot.state == ReadinessState::Polling {
                assert!(snapshot.progress <= 99.0);
            }
            last = snapshot.progress;
        }

        let final_snapshot = seen.last().copied().unwrap();
        assert_eq!(final_snapshot.state, ReadinessState::Ready);
        assert_eq!(final_snapshot.progress, 100.0);
        assert_eq!(final_snapshot.attempts, failures + 1);
    }
}

#[test]
fn test_progress_meter_steps_across_seeds() {
    for mut rng in pseudo_generators(11, 8) {
        let mut meter = ProgressMeter::new(ProgressSchedule::default());
        let mut prev = meter.value();

        while meter.cadence().is_some() {
            let phase = meter.phase();
            let next = meter.advance(rng.rng());
            let step = next - prev;

            match phase {
                ProgressPhase::Fast => {
                    assert!(next <= 90.0, "seed {}: {next}", rng.seed());
                    assert!(next == 90.0 || (4.999..13.001).contains(&step), "step {step}");
                }
                ProgressPhase::Slow => {
                    assert!(next <= 99.0, "seed {}: {next}", rng.seed());
                    assert!(next == 99.0 || (0.199..0.701).contains(&step), "step {step}");
                }
                other => panic!("advanced in {other:?}"),
            }
            prev = next;
        }

        assert_eq!(meter.phase(), ProgressPhase::Stalled);
        assert_eq!(meter.value(), 99.0);
    }
}

#[tokio::test(start_paused = true)]
async fn test_gives_up_after_max_attempts() {
    let probe = MockProbe::never_ready();
    let config = PollerConfig::default().with_max_attempts(3).with_seed(3);
    let mut poller = ReadinessPoller::new(probe.clone(), config);
    let fired = start(&mut poller);

    let err = poller.wait_ready().await.unwrap_err();
    assert_eq!(err, ReadinessError::Exhausted { attempts: 3 });
    assert_eq!(poller.snapshot().state, ReadinessState::Exhausted);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(probe.calls(), 3);
    assert!(!fired.load(Ordering::SeqCst));
    assert!(poller.snapshot().progress < 100.0);
}

#[tokio::test(start_paused = true)]
async fn test_stop_before_ready() {
    let probe = MockProbe::failing(10);
    let mut poller = ReadinessPoller::new(probe.clone(), PollerConfig::default().with_seed(4));
    let fired = start(&mut poller);

    tokio::time::sleep(Duration::from_secs(5)).await;
    poller.stop();
    let calls = probe.calls();
    let progress = poller.snapshot().progress;

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(probe.calls(), calls);
    assert_eq!(poller.snapshot().progress, progress);
    assert_eq!(poller.snapshot().state, ReadinessState::Polling);
    assert!(!fired.load(Ordering::SeqCst));
}
