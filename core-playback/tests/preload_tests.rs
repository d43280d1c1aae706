//! Integration tests for the preload scheduler

mod common;

use bridge_traits::QueueItem;
use common::{
    harness, harness_with_bus, remote, url_for, wait_idle, wait_until, FakeByteCache,
    FakeResolver,
};
use core_playback::config::PreloadConfig;
use core_playback::error::PlaybackError;
use core_playback::preload::{JobPhase, PreloadScheduler};
use core_playback::resolution::ResolutionCoordinator;
use core_playback::stream_cache::StreamUrlCache;
use core_runtime::events::{CoreEvent, EventBus, PreloadEvent};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

fn set(keys: &[&str]) -> BTreeSet<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

#[tokio::test]
async fn test_window_is_previous_plus_first_upcoming() {
    let h = harness(PreloadConfig::default());
    let current = QueueItem::remote("S1");
    let previous = QueueItem::remote("S0");
    let upcoming = remote(&["S2", "S3", "S4", "S5"]);

    let update = h
        .scheduler
        .update_window(Some(&current), &upcoming, Some(&previous))
        .unwrap();

    assert_eq!(update.launched, vec!["S0", "S2", "S3", "S4"]);
    assert!(update.cancelled.is_empty());
    assert_eq!(h.scheduler.active_job_count(), 4);

    let snapshot = wait_idle(&h.scheduler).await;
    assert_eq!(snapshot.warmed_keys, set(&["S0", "S2", "S3", "S4"]));
    assert_eq!(snapshot.active_key, None);
    assert_eq!(h.resolver.call_count("S5"), 0);
    assert_eq!(h.resolver.call_count("S1"), 0);

    for (key, url, max_bytes) in h.bytes.prefetch_calls() {
        assert_eq!(url, url_for(&key));
        assert_eq!(max_bytes, 3 * 1024 * 1024);
    }
}

#[tokio::test]
async fn test_same_window_twice_launches_nothing() {
    let h = harness(PreloadConfig::default());
    let current = QueueItem::remote("X");
    let upcoming = remote(&["A", "B"]);
    let gate = h.bytes.gate("B");

    let first = h.scheduler.update_window(Some(&current), &upcoming, None).unwrap();
    assert_eq!(first.launched, vec!["A", "B"]);

    // B still in flight, A possibly done
    let second = h.scheduler.update_window(Some(&current), &upcoming, None).unwrap();
    assert!(second.is_unchanged());
    assert_eq!(second.targets, vec!["A", "B"]);

    gate.notify_one();
    wait_idle(&h.scheduler).await;

    let third = h.scheduler.update_window(Some(&current), &upcoming, None).unwrap();
    assert!(third.is_unchanged());
    assert_eq!(h.resolver.call_count("A"), 1);
    assert_eq!(h.resolver.call_count("B"), 1);
}

#[tokio::test]
async fn test_window_replacement_touches_only_the_difference() {
    let h = harness(PreloadConfig::default());
    let current = QueueItem::remote("X");

    h.scheduler
        .update_window(Some(&current), &remote(&["A", "B", "C"]), None)
        .unwrap();
    let snapshot = wait_idle(&h.scheduler).await;
    assert_eq!(snapshot.warmed_keys, set(&["A", "B", "C"]));

    let update = h
        .scheduler
        .update_window(Some(&current), &remote(&["B", "C", "D"]), None)
        .unwrap();

    assert_eq!(update.cancelled, vec!["A"]);
    assert_eq!(update.launched, vec!["D"]);

    let snapshot = wait_idle(&h.scheduler).await;
    assert_eq!(snapshot.warmed_keys, set(&["B", "C", "D"]));
    assert_eq!(h.resolver.call_count("B"), 1);
    assert_eq!(h.resolver.call_count("C"), 1);
    assert_eq!(h.scheduler.job_phase("A"), None);
}

#[tokio::test]
async fn test_moving_away_abandons_in_flight_prefetch() {
    let h = harness(PreloadConfig::default());
    let current = QueueItem::remote("X");
    let gate = h.bytes.gate("A");

    h.scheduler
        .update_window(Some(&current), &remote(&["A"]), None)
        .unwrap();
    let bytes = h.bytes.clone();
    wait_until(|| bytes.prefetch_started("A")).await;
    assert_eq!(h.scheduler.job_phase("A"), Some(JobPhase::Prefetching));

    let update = h
        .scheduler
        .update_window(Some(&current), &remote(&["B"]), None)
        .unwrap();
    assert_eq!(update.cancelled, vec!["A"]);

    gate.notify_one();
    let snapshot = wait_idle(&h.scheduler).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(!snapshot.is_warmed("A"));
    assert!(!h.scheduler.snapshot().is_warmed("A"));
    assert!(!h.bytes.completed().contains(&"A".to_string()));
    assert!(h.scheduler.snapshot().is_warmed("B"));
}

#[tokio::test]
async fn test_cancel_between_resolution_and_prefetch_never_warms() {
    let config = PreloadConfig::default();
    let resolver = FakeResolver::new();
    let bytes = FakeByteCache::new();
    let cache = Arc::new(StreamUrlCache::new(
        config.stream_cache.clone(),
        Arc::new(bridge_traits::SystemClock),
    ));
    let coordinator = Arc::new(ResolutionCoordinator::new(
        cache,
        resolver.clone(),
        config.resolution_timeout,
    ));
    let scheduler = Arc::new(PreloadScheduler::new(
        coordinator,
        bytes.clone(),
        &config,
        None,
    ));

    // Cancellation lands after the URL is obtained, before any byte I/O
    let weak = Arc::downgrade(&scheduler);
    resolver.on_success(move |_| {
        if let Some(scheduler) = weak.upgrade() {
            scheduler.cancel_all();
        }
    });

    let current = QueueItem::remote("X");
    scheduler
        .update_window(Some(&current), &remote(&["A"]), None)
        .unwrap();

    let snapshot = wait_idle(&scheduler).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(resolver.call_count("A"), 1);
    assert!(bytes.prefetch_calls().is_empty());
    assert!(!snapshot.is_warmed("A"));
    assert!(!scheduler.is_warmed("A").await);
}

#[tokio::test]
async fn test_cancelled_while_resolving_skips_prefetch() {
    let h = harness(PreloadConfig::default());
    let current = QueueItem::remote("X");
    let gate = h.resolver.gate("A");

    h.scheduler
        .update_window(Some(&current), &remote(&["A"]), None)
        .unwrap();
    let resolver = h.resolver.clone();
    wait_until(|| resolver.call_count("A") == 1).await;

    assert_eq!(h.scheduler.cancel_all(), 1);
    gate.notify_one();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(!h.bytes.prefetch_started("A"));
    assert!(h.scheduler.snapshot().is_idle());
    assert!(h.scheduler.snapshot().warmed_keys.is_empty());
}

#[tokio::test]
async fn test_failed_resolution_does_not_block_siblings() {
    let h = harness(PreloadConfig::default());
    h.resolver.fail("B");
    let current = QueueItem::remote("X");

    h.scheduler
        .update_window(Some(&current), &remote(&["A", "B", "C"]), None)
        .unwrap();
    let snapshot = wait_idle(&h.scheduler).await;

    assert_eq!(snapshot.warmed_keys, set(&["A", "C"]));
    assert!(!h.bytes.prefetch_started("B"));
    assert_eq!(h.scheduler.job_phase("B"), Some(JobPhase::Failed));
    assert!(h.cache.get("B").is_none());
}

#[tokio::test]
async fn test_failed_key_is_not_retried_while_in_window() {
    let h = harness(PreloadConfig::default());
    h.resolver.fail("B");
    let current = QueueItem::remote("X");
    let upcoming = remote(&["A", "B"]);

    let first = h.scheduler.update_window(Some(&current), &upcoming, None).unwrap();
    assert_eq!(first.launched, vec!["A", "B"]);
    wait_idle(&h.scheduler).await;

    let second = h.scheduler.update_window(Some(&current), &upcoming, None).unwrap();
    assert!(second.is_unchanged());
    assert_eq!(h.resolver.call_count("B"), 1);
    assert_eq!(h.scheduler.job_phase("B"), Some(JobPhase::Failed));
}

#[tokio::test]
async fn test_failed_key_retries_after_leaving_window() {
    let h = harness(PreloadConfig::default());
    h.resolver.fail("B");
    let current = QueueItem::remote("X");

    h.scheduler
        .update_window(Some(&current), &remote(&["B"]), None)
        .unwrap();
    wait_idle(&h.scheduler).await;

    let away = h
        .scheduler
        .update_window(Some(&current), &remote(&["C"]), None)
        .unwrap();
    assert_eq!(away.launched, vec!["C"]);
    assert_eq!(h.scheduler.job_phase("B"), None);

    let back = h
        .scheduler
        .update_window(Some(&current), &remote(&["B", "C"]), None)
        .unwrap();
    assert_eq!(back.launched, vec!["B"]);
    wait_idle(&h.scheduler).await;
    assert_eq!(h.resolver.call_count("B"), 2);
}

#[tokio::test]
async fn test_cancel_all_forgets_failures() {
    let h = harness(PreloadConfig::default());
    h.resolver.fail("A");
    let current = QueueItem::remote("X");

    h.scheduler
        .update_window(Some(&current), &remote(&["A"]), None)
        .unwrap();
    wait_idle(&h.scheduler).await;
    assert_eq!(h.scheduler.job_phase("A"), Some(JobPhase::Failed));

    h.scheduler.cancel_all();
    assert_eq!(h.scheduler.job_phase("A"), None);

    let update = h
        .scheduler
        .update_window(Some(&current), &remote(&["A"]), None)
        .unwrap();
    assert_eq!(update.launched, vec!["A"]);
}

#[tokio::test]
async fn test_failed_prefetch_leaves_key_cold() {
    let h = harness(PreloadConfig::default());
    h.bytes.fail("C");
    let current = QueueItem::remote("X");

    h.scheduler
        .update_window(Some(&current), &remote(&["A", "B", "C"]), None)
        .unwrap();
    let snapshot = wait_idle(&h.scheduler).await;

    assert_eq!(snapshot.warmed_keys, set(&["A", "B"]));
    assert!(!h.scheduler.is_warmed("C").await);
    // The URL itself was fine and stays cached
    assert_eq!(h.cache.get("C"), Some(url_for("C")));
}

#[tokio::test]
async fn test_panicking_byte_cache_is_contained() {
    let h = harness(PreloadConfig::default());
    h.bytes.panic_on("A");
    let current = QueueItem::remote("X");

    h.scheduler
        .update_window(Some(&current), &remote(&["A", "B"]), None)
        .unwrap();
    let snapshot = wait_idle(&h.scheduler).await;

    assert_eq!(snapshot.warmed_keys, set(&["B"]));
    assert_eq!(h.scheduler.active_job_count(), 0);
    assert_eq!(h.scheduler.job_phase("A"), Some(JobPhase::Failed));
}

#[tokio::test]
async fn test_ineligible_current_is_noop() {
    let h = harness(PreloadConfig::default());
    let local = QueueItem::local("L1", "/music/a.flac");

    let update = h
        .scheduler
        .update_window(Some(&local), &remote(&["A"]), None)
        .unwrap();
    assert!(update.targets.is_empty());
    assert!(update.is_unchanged());

    let update = h.scheduler.update_window(None, &remote(&["A"]), None).unwrap();
    assert!(update.is_unchanged());
    assert_eq!(h.scheduler.active_job_count(), 0);
}

#[tokio::test]
async fn test_ineligible_current_keeps_existing_window() {
    let h = harness(PreloadConfig::default());
    let current = QueueItem::remote("X");
    h.scheduler
        .update_window(Some(&current), &remote(&["A"]), None)
        .unwrap();
    wait_idle(&h.scheduler).await;

    let local = QueueItem::local("L1", "/music/a.flac");
    h.scheduler
        .update_window(Some(&local), &remote(&["B"]), None)
        .unwrap();

    assert!(h.scheduler.snapshot().is_warmed("A"));
    assert_eq!(h.resolver.call_count("B"), 0);
}

#[tokio::test]
async fn test_is_warmed_falls_back_to_byte_cache() {
    let h = harness(PreloadConfig::default());
    h.bytes.store("host-cached", 1024);

    assert!(h.scheduler.is_warmed("host-cached").await);
    assert!(!h.scheduler.is_warmed("unknown").await);
    assert!(!h.scheduler.snapshot().is_warmed("host-cached"));
}

#[tokio::test]
async fn test_leaving_window_forgets_warmed_state() {
    let h = harness(PreloadConfig::default());
    let current = QueueItem::remote("X");

    h.scheduler
        .update_window(Some(&current), &remote(&["A", "B"]), None)
        .unwrap();
    wait_idle(&h.scheduler).await;
    assert_eq!(h.scheduler.job_phase("A"), Some(JobPhase::Completed));

    let update = h
        .scheduler
        .update_window(Some(&current), &remote(&["B"]), None)
        .unwrap();

    assert_eq!(update.cancelled, vec!["A"]);
    assert!(update.launched.is_empty());
    assert_eq!(h.scheduler.snapshot().warmed_keys, set(&["B"]));
    assert_eq!(h.scheduler.job_phase("A"), None);
}

#[tokio::test]
async fn test_key_reentering_window_gets_fresh_job() {
    let bus = Arc::new(EventBus::new(64));
    let mut events = bus.subscribe();
    let h = harness_with_bus(PreloadConfig::default(), Some(bus));
    let current = QueueItem::remote("X");
    let gate = h.bytes.gate("A");

    h.scheduler
        .update_window(Some(&current), &remote(&["A"]), None)
        .unwrap();
    let bytes = h.bytes.clone();
    wait_until(|| bytes.prefetch_started("A")).await;

    h.scheduler
        .update_window(Some(&current), &remote(&["B"]), None)
        .unwrap();
    let update = h
        .scheduler
        .update_window(Some(&current), &remote(&["A", "B"]), None)
        .unwrap();
    assert_eq!(update.launched, vec!["A"]);

    let bytes = h.bytes.clone();
    wait_until(|| {
        bytes
            .prefetch_calls()
            .iter()
            .filter(|(k, _, _)| k == "A")
            .count()
            == 2
    })
    .await;
    gate.notify_one();
    let snapshot = wait_idle(&h.scheduler).await;
    assert_eq!(snapshot.warmed_keys, set(&["A", "B"]));

    let mut started = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let CoreEvent::Preload(PreloadEvent::JobStarted { job_id, key }) = event {
            if key == "A" {
                started.push(job_id);
            }
        }
    }
    assert_eq!(started.len(), 2);
    assert_ne!(started[0], started[1]);
}

#[tokio::test]
async fn test_active_key_is_latest_launch() {
    let h = harness(PreloadConfig::default());
    let gates: Vec<_> = ["S0", "S2", "S3", "S4"]
        .iter()
        .map(|key| h.bytes.gate(key))
        .collect();
    let current = QueueItem::remote("S1");
    let previous = QueueItem::remote("S0");

    h.scheduler
        .update_window(Some(&current), &remote(&["S2", "S3", "S4"]), Some(&previous))
        .unwrap();

    let snapshot = h.scheduler.snapshot();
    assert_eq!(snapshot.active_key.as_deref(), Some("S4"));
    assert_eq!(snapshot.warming_keys, set(&["S0", "S2", "S3", "S4"]));

    for gate in &gates {
        gate.notify_one();
    }
    let snapshot = wait_idle(&h.scheduler).await;
    assert_eq!(snapshot.active_key, None);
}

#[tokio::test]
async fn test_snapshots_never_show_a_key_warming_and_warmed() {
    let h = harness(PreloadConfig::default());
    let mut rx = h.scheduler.subscribe();
    let current = QueueItem::remote("X");

    h.scheduler
        .update_window(Some(&current), &remote(&["A", "B", "C"]), None)
        .unwrap();

    tokio::time::timeout(common::WAIT, async {
        loop {
            rx.changed().await.unwrap();
            let snapshot = rx.borrow_and_update().clone();
            assert!(snapshot.warming_keys.is_disjoint(&snapshot.warmed_keys));
            if snapshot.is_idle() {
                break;
            }
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_zero_preload_items_warms_previous_only() {
    let h = harness(PreloadConfig::default().with_max_preload_items(0));
    let current = QueueItem::remote("S1");
    let previous = QueueItem::remote("S0");

    let update = h
        .scheduler
        .update_window(Some(&current), &remote(&["S2"]), Some(&previous))
        .unwrap();

    assert_eq!(update.launched, vec!["S0"]);
}

#[tokio::test]
async fn test_cancel_all_resets_state() {
    let h = harness(PreloadConfig::default());
    let current = QueueItem::remote("X");
    let _gate = h.bytes.gate("B");

    h.scheduler
        .update_window(Some(&current), &remote(&["A", "B"]), None)
        .unwrap();
    let scheduler = &h.scheduler;
    wait_until(|| scheduler.job_phase("A") == Some(JobPhase::Completed)).await;

    assert_eq!(h.scheduler.cancel_all(), 1);
    assert_eq!(h.scheduler.snapshot(), Default::default());

    // Still usable afterwards
    let update = h
        .scheduler
        .update_window(Some(&current), &remote(&["A"]), None)
        .unwrap();
    assert_eq!(update.launched, vec!["A"]);
}

#[tokio::test]
async fn test_release_refuses_further_updates() {
    let h = harness(PreloadConfig::default());
    let current = QueueItem::remote("X");
    let _gate = h.bytes.gate("A");

    h.scheduler
        .update_window(Some(&current), &remote(&["A"]), None)
        .unwrap();
    h.scheduler.release();

    assert!(h.scheduler.is_released());
    assert!(h.scheduler.snapshot().is_idle());
    assert!(matches!(
        h.scheduler.update_window(Some(&current), &remote(&["A"]), None),
        Err(PlaybackError::SchedulerReleased)
    ));
}

#[tokio::test]
async fn test_dropping_scheduler_cancels_jobs() {
    let h = harness(PreloadConfig::default());
    let current = QueueItem::remote("X");
    let gate = h.bytes.gate("A");

    h.scheduler
        .update_window(Some(&current), &remote(&["A"]), None)
        .unwrap();
    let bytes = h.bytes.clone();
    wait_until(|| bytes.prefetch_started("A")).await;

    drop(h.scheduler);
    gate.notify_one();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(h.bytes.completed().is_empty());
}

#[tokio::test]
async fn test_lifecycle_events() {
    let bus = Arc::new(EventBus::new(64));
    let mut events = bus.subscribe();
    let h = harness_with_bus(PreloadConfig::default(), Some(bus));
    h.resolver.fail("B");
    let current = QueueItem::remote("X");

    h.scheduler
        .update_window(Some(&current), &remote(&["A", "B"]), None)
        .unwrap();
    wait_idle(&h.scheduler).await;

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let CoreEvent::Preload(event) = event {
            seen.push(event);
        }
    }

    let both = vec!["A".to_string(), "B".to_string()];
    assert!(seen.iter().any(|e| matches!(
        e,
        PreloadEvent::WindowUpdated { launched, .. } if launched == &both
    )));
    assert!(seen.iter().any(|e| matches!(
        e,
        PreloadEvent::JobCompleted { key, bytes, .. }
            if key == "A" && *bytes == 3 * 1024 * 1024
    )));
    assert!(seen.iter().any(|e| matches!(
        e,
        PreloadEvent::JobFailed { key, .. } if key == "B"
    )));
}
