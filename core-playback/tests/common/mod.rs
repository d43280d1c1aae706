//! Fakes shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{BridgeError, ByteRangeCache, QueueItem, ResolvedStream, StreamResolver};
use core_playback::config::PreloadConfig;
use core_playback::preload::{PreloadScheduler, PreloadSnapshot};
use core_playback::resolution::ResolutionCoordinator;
use core_playback::stream_cache::StreamUrlCache;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

pub const WAIT: Duration = Duration::from_secs(5);

pub fn remote(keys: &[&str]) -> Vec<QueueItem> {
    keys.iter().map(|key| QueueItem::remote(*key)).collect()
}

pub fn url_for(key: &str) -> String {
    format!("https://media.test/{}?expire=1&sig=abc", key)
}

type Hook = Box<dyn Fn(&str) + Send + Sync>;

/// Resolver that answers `url_for(key)` unless told otherwise.
#[derive(Default)]
pub struct FakeResolver {
    failing: Mutex<HashSet<String>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    calls: Mutex<Vec<String>>,
    hook: Mutex<Option<Hook>>,
}

impl FakeResolver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail(&self, key: &str) {
        self.failing.lock().insert(key.to_string());
    }

    /// Hold resolution of `key` until the returned gate is notified.
    pub fn gate(&self, key: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().insert(key.to_string(), Arc::clone(&gate));
        gate
    }

    /// Run `hook` right before a successful answer is returned.
    pub fn on_success(&self, hook: impl Fn(&str) + Send + Sync + 'static) {
        *self.hook.lock() = Some(Box::new(hook));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, key: &str) -> usize {
        self.calls.lock().iter().filter(|k| *k == key).count()
    }
}

#[async_trait]
impl StreamResolver for FakeResolver {
    async fn resolve(&self, key: &str) -> BridgeResult<ResolvedStream> {
        self.calls.lock().push(key.to_string());

        let gate = self.gates.lock().get(key).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.failing.lock().contains(key) {
            return Err(BridgeError::Network(format!("{} unreachable", key)));
        }

        if let Some(hook) = self.hook.lock().as_ref() {
            hook(key);
        }

        Ok(ResolvedStream::new(url_for(key)).with_bitrate(160))
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Byte-range cache that stores sizes only.
#[derive(Default)]
pub struct FakeByteCache {
    cached: Mutex<HashMap<String, u64>>,
    failing: Mutex<HashSet<String>>,
    panicking: Mutex<HashSet<String>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    prefetch_calls: Mutex<Vec<(String, String, u64)>>,
    completed: Mutex<Vec<String>>,
}

impl FakeByteCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail(&self, key: &str) {
        self.failing.lock().insert(key.to_string());
    }

    pub fn panic_on(&self, key: &str) {
        self.panicking.lock().insert(key.to_string());
    }

    /// Hold prefetches of `key` until the returned gate is notified.
    pub fn gate(&self, key: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().insert(key.to_string(), Arc::clone(&gate));
        gate
    }

    /// Pretend the host cached `key` on its own.
    pub fn store(&self, key: &str, bytes: u64) {
        self.cached.lock().insert(key.to_string(), bytes);
    }

    pub fn prefetch_calls(&self) -> Vec<(String, String, u64)> {
        self.prefetch_calls.lock().clone()
    }

    pub fn prefetch_started(&self, key: &str) -> bool {
        self.prefetch_calls.lock().iter().any(|(k, _, _)| k == key)
    }

    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().clone()
    }
}

#[async_trait]
impl ByteRangeCache for FakeByteCache {
    async fn prefetch(&self, key: &str, url: &str, max_bytes: u64) -> BridgeResult<u64> {
        self.prefetch_calls
            .lock()
            .push((key.to_string(), url.to_string(), max_bytes));

        let gate = self.gates.lock().get(key).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.panicking.lock().contains(key) {
            panic!("byte cache blew up for {}", key);
        }

        if self.failing.lock().contains(key) {
            return Err(BridgeError::OperationFailed("disk full".to_string()));
        }

        self.cached.lock().insert(key.to_string(), max_bytes);
        self.completed.lock().push(key.to_string());
        Ok(max_bytes)
    }

    async fn cached_byte_count(&self, key: &str) -> BridgeResult<u64> {
        Ok(self.cached.lock().get(key).copied().unwrap_or(0))
    }
}

pub struct Harness {
    pub resolver: Arc<FakeResolver>,
    pub bytes: Arc<FakeByteCache>,
    pub cache: Arc<StreamUrlCache>,
    pub scheduler: PreloadScheduler,
}

pub fn harness(config: PreloadConfig) -> Harness {
    harness_with_bus(config, None)
}

pub fn harness_with_bus(
    config: PreloadConfig,
    bus: Option<Arc<core_runtime::events::EventBus>>,
) -> Harness {
    let resolver = FakeResolver::new();
    let bytes = FakeByteCache::new();
    let cache = Arc::new(StreamUrlCache::new(
        config.stream_cache.clone(),
        Arc::new(bridge_traits::SystemClock),
    ));
    let coordinator = Arc::new(ResolutionCoordinator::new(
        Arc::clone(&cache),
        resolver.clone(),
        config.resolution_timeout,
    ));
    let scheduler = PreloadScheduler::new(coordinator, bytes.clone(), &config, bus);

    Harness {
        resolver,
        bytes,
        cache,
        scheduler,
    }
}

/// Wait until no job is in flight and return the resulting snapshot.
pub async fn wait_idle(scheduler: &PreloadScheduler) -> PreloadSnapshot {
    let mut rx = scheduler.subscribe();
    let snapshot = tokio::time::timeout(WAIT, rx.wait_for(|snapshot| snapshot.is_idle()))
        .await
        .expect("scheduler did not settle")
        .expect("snapshot channel closed")
        .clone();
    snapshot
}

/// Poll `condition` until it holds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
