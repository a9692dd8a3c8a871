//! Property tests for HealthTracker

use codeflow_core::health::EMA_ALPHA;
use codeflow_core::{HealthStatus, HealthTracker};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Event {
    Success { synced: usize, failed: usize, duration_ms: f64 },
    Failure,
}

fn event() -> impl Strategy<Value = Event> {
    prop_oneof![
        (0usize..50, 0usize..10, 0.1f64..5_000.0).prop_map(|(synced, failed, duration_ms)| {
            Event::Success {
                synced,
                failed,
                duration_ms,
            }
        }),
        Just(Event::Failure),
    ]
}

proptest! {
    #[test]
    fn error_rate_matches_counters(
        total in 0usize..20,
        events in prop::collection::vec(event(), 1..20),
    ) {
        let tracker = HealthTracker::new();
        tracker.set_total_agents(total);

        for event in events {
            match event {
                Event::Success { synced, failed, duration_ms } => {
                    tracker.record_success(synced, failed, duration_ms)
                }
                Event::Failure => tracker.record_failure("boom"),
            }

            let health = tracker.snapshot();
            let expected = if health.total_agents == 0 {
                0.0
            } else {
                health.failed_agents as f64 / health.total_agents as f64
            };
            prop_assert!((health.error_rate - expected).abs() < 1e-12);

            let summary = tracker.summary();
            let status = if health.error_rate > 0.5 {
                HealthStatus::Critical
            } else if health.error_rate > 0.2 {
                HealthStatus::Warning
            } else {
                HealthStatus::Healthy
            };
            prop_assert_eq!(summary.status, status);
            prop_assert_eq!(
                summary.message.contains(" - Last error: "),
                health.last_error.is_some()
            );
        }
    }

    #[test]
    fn average_follows_moving_average(durations in prop::collection::vec(0.1f64..10_000.0, 1..30)) {
        let tracker = HealthTracker::new();
        let mut expected = 0.0;

        for duration in durations {
            expected = if expected == 0.0 {
                duration
            } else {
                expected * (1.0 - EMA_ALPHA) + duration * EMA_ALPHA
            };
            tracker.record_success(1, 0, duration);
            prop_assert!((tracker.snapshot().average_sync_time - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn failures_do_not_move_the_average(first in 0.1f64..1_000.0, failures in 1usize..10) {
        let tracker = HealthTracker::new();
        tracker.record_success(1, 0, first);
        for _ in 0..failures {
            tracker.record_failure("boom");
        }
        prop_assert_eq!(tracker.snapshot().average_sync_time, first);
        prop_assert_eq!(tracker.snapshot().failed_agents, failures);
    }
}

#[test]
fn test_summary_reports_critical_with_last_error() {
    let tracker = HealthTracker::new();
    tracker.set_total_agents(2);
    tracker.record_success(0, 1, 10.0);
    tracker.record_failure("disk full");

    let summary = tracker.summary();

    assert_eq!(summary.status, HealthStatus::Critical);
    assert_eq!(summary.message, "Critical: 100.0% sync failure rate - Last error: disk full");
    assert_eq!(summary.metrics.average_sync_time_ms, 10);
}
