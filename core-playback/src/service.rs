//! # Preload Service
//!
//! Wires the stream URL cache, the resolution coordinator and the preload
//! scheduler from a [`CoreConfig`].

use crate::config::PreloadConfig;
use crate::error::Result;
use crate::preload::{PreloadEligibility, PreloadScheduler, PreloadSnapshot, WindowUpdate};
use crate::resolution::ResolutionCoordinator;
use crate::stream_cache::{StreamCacheStats, StreamUrlCache};
use bridge_traits::QueueItem;
use core_async::sync::watch;
use core_runtime::config::CoreConfig;
use std::sync::Arc;
use tracing::{info, instrument};

/// Entry point for hosts: one instance per playback session.
///
/// ```ignore
/// let core = CoreConfig::builder()
///     .stream_resolver(Arc::new(extractor))
///     .byte_range_cache(Arc::new(disk_cache))
///     .build()?;
/// let service = PreloadService::new(&core, PreloadConfig::default())?;
///
/// // on every position change
/// service.update_window(Some(&current), &upcoming, previous.as_ref())?;
///
/// // when starting playback
/// let url = service.resolve(&current.key).await;
/// ```
pub struct PreloadService {
    config: PreloadConfig,
    cache: Arc<StreamUrlCache>,
    coordinator: Arc<ResolutionCoordinator>,
    scheduler: PreloadScheduler,
}

impl PreloadService {
    /// Build the service, warming remote items only.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::InvalidConfig`](crate::PlaybackError::InvalidConfig)
    /// if `config` fails validation.
    #[instrument(skip_all)]
    pub fn new(core: &CoreConfig, config: PreloadConfig) -> Result<Self> {
        config.validate()?;

        let mut cache = StreamUrlCache::new(config.stream_cache.clone(), Arc::clone(&core.clock));
        if let Some(bus) = &core.event_bus {
            cache = cache.with_event_bus(Arc::clone(bus));
        }
        let cache = Arc::new(cache);

        let mut coordinator = ResolutionCoordinator::new(
            Arc::clone(&cache),
            Arc::clone(&core.stream_resolver),
            config.resolution_timeout,
        );
        if let Some(bus) = &core.event_bus {
            coordinator = coordinator.with_event_bus(Arc::clone(bus));
        }
        let coordinator = Arc::new(coordinator);

        let scheduler = PreloadScheduler::new(
            Arc::clone(&coordinator),
            Arc::clone(&core.byte_range_cache),
            &config,
            core.event_bus.clone(),
        );

        info!(
            max_preload_items = config.max_preload_items,
            max_entries = config.stream_cache.max_entries,
            resolver = core.stream_resolver.name(),
            "Preload service initialized"
        );

        Ok(Self {
            config,
            cache,
            coordinator,
            scheduler,
        })
    }

    /// Replace the eligibility predicate (remote items only by default).
    pub fn with_eligibility(mut self, eligibility: Arc<dyn PreloadEligibility>) -> Self {
        self.scheduler = self.scheduler.with_eligibility(eligibility);
        self
    }

    pub fn config(&self) -> &PreloadConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<StreamUrlCache> {
        &self.cache
    }

    pub fn coordinator(&self) -> &Arc<ResolutionCoordinator> {
        &self.coordinator
    }

    pub fn scheduler(&self) -> &PreloadScheduler {
        &self.scheduler
    }

    /// See [`PreloadScheduler::update_window`].
    pub fn update_window(
        &self,
        current: Option<&QueueItem>,
        upcoming: &[QueueItem],
        previous: Option<&QueueItem>,
    ) -> Result<WindowUpdate> {
        self.scheduler.update_window(current, upcoming, previous)
    }

    /// Playable URL for `key`, from the cache when possible.
    pub async fn resolve(&self, key: &str) -> Option<String> {
        self.coordinator.resolve(key).await
    }

    /// Drop the cached URL for `key` after playback rejected it.
    pub fn invalidate(&self, key: &str) -> bool {
        self.coordinator.invalidate(key)
    }

    pub async fn is_warmed(&self, key: &str) -> bool {
        self.scheduler.is_warmed(key).await
    }

    pub fn snapshot(&self) -> PreloadSnapshot {
        self.scheduler.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<PreloadSnapshot> {
        self.scheduler.subscribe()
    }

    pub fn cache_stats(&self) -> StreamCacheStats {
        self.cache.stats()
    }

    pub fn cancel_all(&self) -> usize {
        self.scheduler.cancel_all()
    }

    /// Stop all preloading. The URL cache stays usable for `resolve`.
    pub fn shutdown(&self) {
        self.scheduler.release();
    }
}

impl std::fmt::Debug for PreloadService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreloadService")
            .field("config", &self.config)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}
