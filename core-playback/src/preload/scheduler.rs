//! # Preload Scheduler
//!
//! Keeps a sliding window of queue items warm.
//!
//! Each window update is a synchronous reconciliation under one lock:
//! jobs for keys that left the window are cancelled, warmed and failed
//! bookkeeping for those keys is dropped, and a job is launched for every
//! target with no job and no recorded outcome. A failed key is not retried
//! until it leaves the window and comes back. Jobs run concurrently, one per key, as
//! children of a scheduler-wide cancellation token.
//!
//! A job resolves the stream URL, checks for cancellation, then asks the
//! byte-range cache to store the stream prefix. Both calls are abandoned
//! as soon as the job's token fires. When the job ends it reports back
//! only if the job table still holds its own id; a job replaced or
//! cancelled in the meantime leaves no trace.

use super::job::{JobOutcome, JobPhase, PreloadJobId};
use super::snapshot::{PreloadSnapshot, WindowUpdate};
use super::window::{plan_window, PreloadEligibility, RemoteOnly};
use crate::config::PreloadConfig;
use crate::error::{PlaybackError, Result};
use crate::resolution::ResolutionCoordinator;
use bridge_traits::{ByteRangeCache, QueueItem};
use core_async::sync::{watch, CancellationToken};
use core_runtime::events::{CoreEvent, EventBus, PreloadEvent};
use futures::FutureExt;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, info, info_span, instrument, trace, warn, Instrument};

struct ActiveJob {
    id: PreloadJobId,
    /// Launch order, used to pick the snapshot's active key
    seq: u64,
    phase: JobPhase,
    token: CancellationToken,
}

#[derive(Default)]
struct SchedulerState {
    jobs: HashMap<String, ActiveJob>,
    warmed: BTreeSet<String>,
    failed: BTreeSet<String>,
    next_seq: u64,
    released: bool,
}

impl SchedulerState {
    fn snapshot(&self) -> PreloadSnapshot {
        PreloadSnapshot {
            warming_keys: self.jobs.keys().cloned().collect(),
            warmed_keys: self.warmed.clone(),
            active_key: self
                .jobs
                .iter()
                .max_by_key(|(_, job)| job.seq)
                .map(|(key, _)| key.clone()),
        }
    }
}

struct Inner {
    coordinator: Arc<ResolutionCoordinator>,
    byte_cache: Arc<dyn ByteRangeCache>,
    prefetch_bytes: u64,
    root: CancellationToken,
    state: Mutex<SchedulerState>,
    snapshot_tx: watch::Sender<PreloadSnapshot>,
    event_bus: Option<Arc<EventBus>>,
}

impl Inner {
    /// Publish the current state. Called with the state lock held so that
    /// snapshots go out in transition order.
    fn publish(&self, state: &SchedulerState) {
        self.snapshot_tx.send_replace(state.snapshot());
    }

    fn emit(&self, event: PreloadEvent) {
        if let Some(bus) = &self.event_bus {
            let _ = bus.emit(CoreEvent::Preload(event));
        }
    }

    /// Move the job to `phase` if it still owns its key.
    fn advance(&self, key: &str, id: PreloadJobId, phase: JobPhase) -> bool {
        let mut state = self.state.lock();
        match state.jobs.get_mut(key) {
            Some(job) if job.id == id => {
                job.phase = phase;
                true
            }
            _ => false,
        }
    }

    /// Resolve then prefetch. Returns the number of bytes the cache stored.
    async fn warm(&self, key: &str, id: PreloadJobId, token: &CancellationToken) -> Result<u64> {
        if token.is_cancelled() {
            return Err(PlaybackError::Cancelled);
        }

        let url = token
            .run_until_cancelled(self.coordinator.try_resolve(key))
            .await
            .ok_or(PlaybackError::Cancelled)??;

        // Last checkpoint before any byte I/O
        if token.is_cancelled() || !self.advance(key, id, JobPhase::Prefetching) {
            return Err(PlaybackError::Cancelled);
        }

        let prefetch = self.byte_cache.prefetch(key, &url, self.prefetch_bytes);
        token
            .run_until_cancelled(prefetch)
            .await
            .ok_or(PlaybackError::Cancelled)?
            .map_err(|err| PlaybackError::PrefetchFailed {
                key: key.to_string(),
                message: err.to_string(),
            })
    }

    /// Record the end of a job and republish.
    fn finish(&self, key: &str, id: PreloadJobId, result: Result<u64>) {
        let outcome = JobOutcome::from(result);
        let outcome = {
            let mut state = self.state.lock();
            let owner = state
                .jobs
                .get(key)
                .map(|job| (job.id, job.token.is_cancelled()));

            match owner {
                Some((owner_id, cancelled)) if owner_id == id => {
                    state.jobs.remove(key);
                    let outcome = if cancelled {
                        JobOutcome::Cancelled
                    } else {
                        outcome
                    };
                    match &outcome {
                        JobOutcome::Completed { .. } => {
                            state.warmed.insert(key.to_string());
                        }
                        JobOutcome::Failed(_) => {
                            state.failed.insert(key.to_string());
                        }
                        JobOutcome::Cancelled => {}
                    }
                    self.publish(&state);
                    outcome
                }
                // Superseded: reconciliation already dropped this job
                _ => JobOutcome::Cancelled,
            }
        };

        let job_id = id.to_string();
        let key = key.to_string();
        match outcome {
            JobOutcome::Completed { bytes } => {
                info!(%key, %job_id, bytes, "Preload completed");
                self.emit(PreloadEvent::JobCompleted { job_id, key, bytes });
            }
            JobOutcome::Failed(err) => {
                warn!(
                    %key,
                    %job_id,
                    error = %err,
                    transient = err.is_transient(),
                    "Preload failed"
                );
                self.emit(PreloadEvent::JobFailed {
                    job_id,
                    key,
                    message: err.to_string(),
                });
            }
            JobOutcome::Cancelled => {
                debug!(%key, %job_id, "Preload cancelled");
                self.emit(PreloadEvent::JobCancelled { job_id, key });
            }
        }
    }
}

async fn run_job(inner: Arc<Inner>, key: String, id: PreloadJobId, token: CancellationToken) {
    let result = AssertUnwindSafe(inner.warm(&key, id, &token))
        .catch_unwind()
        .await
        .unwrap_or_else(|_| Err(PlaybackError::Internal("preload job panicked".to_string())));

    inner.finish(&key, id, result);
}

/// Sliding-window preload scheduler.
///
/// Dropping the scheduler cancels every outstanding job.
///
/// # Example
///
/// ```ignore
/// let scheduler = PreloadScheduler::new(coordinator, byte_cache, &PreloadConfig::default(), None);
///
/// let update = scheduler.update_window(Some(&current), &upcoming, previous.as_ref())?;
/// tracing::debug!(launched = ?update.launched, "Window moved");
///
/// if scheduler.is_warmed(&upcoming[0].key).await {
///     // start playback from the byte cache
/// }
/// ```
pub struct PreloadScheduler {
    inner: Arc<Inner>,
    eligibility: Arc<dyn PreloadEligibility>,
    max_preload_items: usize,
}

impl PreloadScheduler {
    /// Create a scheduler that warms remote items only.
    ///
    /// # Arguments
    ///
    /// * `coordinator` - Cache-first URL resolution shared with playback
    /// * `byte_cache` - Host storage for the stream prefix
    /// * `config` - Window size and prefetch size
    /// * `event_bus` - Optional bus for job lifecycle events
    pub fn new(
        coordinator: Arc<ResolutionCoordinator>,
        byte_cache: Arc<dyn ByteRangeCache>,
        config: &PreloadConfig,
        event_bus: Option<Arc<EventBus>>,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(PreloadSnapshot::default());

        Self {
            inner: Arc::new(Inner {
                coordinator,
                byte_cache,
                prefetch_bytes: config.prefetch_bytes,
                root: CancellationToken::new(),
                state: Mutex::new(SchedulerState::default()),
                snapshot_tx,
                event_bus,
            }),
            eligibility: Arc::new(RemoteOnly),
            max_preload_items: config.max_preload_items,
        }
    }

    /// Replace the eligibility predicate.
    pub fn with_eligibility(mut self, eligibility: Arc<dyn PreloadEligibility>) -> Self {
        self.eligibility = eligibility;
        self
    }

    /// Reconcile the job table with a new playback position.
    ///
    /// Must be called from within a Tokio runtime: new jobs are spawned on
    /// it. The call itself never blocks on I/O. Calling it twice with the
    /// same window launches and cancels nothing the second time.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::SchedulerReleased`] after [`release`](Self::release).
    #[instrument(
        skip_all,
        fields(current = current.map(|item| item.key.as_str()).unwrap_or("-"))
    )]
    pub fn update_window(
        &self,
        current: Option<&QueueItem>,
        upcoming: &[QueueItem],
        previous: Option<&QueueItem>,
    ) -> Result<WindowUpdate> {
        let inner = &self.inner;
        let mut state = inner.state.lock();

        if state.released {
            return Err(PlaybackError::SchedulerReleased);
        }

        let Some(targets) = plan_window(
            current,
            upcoming,
            previous,
            self.max_preload_items,
            self.eligibility.as_ref(),
        ) else {
            trace!("Current item absent or not eligible, window unchanged");
            return Ok(WindowUpdate::default());
        };

        let target_keys: Vec<String> = targets.into_iter().map(|target| target.key).collect();
        let wanted: HashSet<&str> = target_keys.iter().map(String::as_str).collect();

        let mut stale: Vec<String> = state
            .jobs
            .keys()
            .filter(|key| !wanted.contains(key.as_str()))
            .cloned()
            .collect();
        stale.sort();

        let mut cancelled = Vec::new();
        for key in stale {
            if let Some(job) = state.jobs.remove(&key) {
                job.token.cancel();
                cancelled.push(key);
            }
        }

        // Bytes of items outside the window may be evicted by the host at any time
        let forgotten: Vec<String> = state
            .warmed
            .iter()
            .filter(|key| !wanted.contains(key.as_str()))
            .cloned()
            .collect();
        for key in forgotten {
            state.warmed.remove(&key);
            cancelled.push(key);
        }
        state.failed.retain(|key| wanted.contains(key.as_str()));

        let mut launched = Vec::new();
        for key in &target_keys {
            if state.jobs.contains_key(key)
                || state.warmed.contains(key)
                || state.failed.contains(key)
            {
                continue;
            }

            let id = PreloadJobId::new();
            let token = inner.root.child_token();
            let seq = state.next_seq;
            state.next_seq += 1;
            state.jobs.insert(
                key.clone(),
                ActiveJob {
                    id,
                    seq,
                    phase: JobPhase::Resolving,
                    token: token.clone(),
                },
            );

            inner.emit(PreloadEvent::JobStarted {
                job_id: id.to_string(),
                key: key.clone(),
            });

            let span = info_span!("preload_job", key = %key, job_id = %id);
            core_async::task::spawn(
                run_job(Arc::clone(inner), key.clone(), id, token).instrument(span),
            );
            launched.push(key.clone());
        }

        let update = WindowUpdate {
            targets: target_keys,
            launched,
            cancelled,
        };

        if !update.is_unchanged() {
            inner.publish(&state);
        }
        drop(state);

        if update.is_unchanged() {
            trace!(targets = ?update.targets, "Preload window unchanged");
        } else {
            debug!(
                targets = ?update.targets,
                launched = ?update.launched,
                cancelled = ?update.cancelled,
                "Preload window updated"
            );
            inner.emit(PreloadEvent::WindowUpdated {
                target_keys: update.targets.clone(),
                launched: update.launched.clone(),
                cancelled: update.cancelled.clone(),
            });
        }

        Ok(update)
    }

    /// Whether `key` can start playback without a network round trip.
    ///
    /// True if a job warmed it, or failing that, if the byte-range cache
    /// independently holds a prefix for it.
    pub async fn is_warmed(&self, key: &str) -> bool {
        let warmed = self.inner.state.lock().warmed.contains(key);
        if warmed {
            return true;
        }
        self.inner.byte_cache.is_cached(key).await
    }

    /// Cancel every job and forget every warmed key.
    ///
    /// Returns how many jobs were in flight.
    pub fn cancel_all(&self) -> usize {
        let mut state = self.inner.state.lock();
        let count = Self::reset(&mut state);
        self.inner.publish(&state);
        drop(state);

        if count > 0 {
            debug!(count, "Cancelled all preload jobs");
        }
        count
    }

    /// Cancel everything and refuse further window updates.
    pub fn release(&self) {
        let mut state = self.inner.state.lock();
        let count = Self::reset(&mut state);
        state.released = true;
        self.inner.root.cancel();
        self.inner.publish(&state);
        drop(state);

        info!(cancelled = count, "Preload scheduler released");
    }

    fn reset(state: &mut SchedulerState) -> usize {
        let count = state.jobs.len();
        for (_, job) in state.jobs.drain() {
            job.token.cancel();
        }
        state.warmed.clear();
        state.failed.clear();
        count
    }

    pub fn is_released(&self) -> bool {
        self.inner.state.lock().released
    }

    /// Current observable state.
    pub fn snapshot(&self) -> PreloadSnapshot {
        self.inner.snapshot_tx.borrow().clone()
    }

    /// Receiver that yields every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<PreloadSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    /// Phase of the job for `key`.
    ///
    /// `Resolving` or `Prefetching` while a job is in flight, `Completed`
    /// once the key is warmed, `Failed` while a failed key stays in the
    /// window, `None` otherwise.
    pub fn job_phase(&self, key: &str) -> Option<JobPhase> {
        let state = self.inner.state.lock();
        match state.jobs.get(key) {
            Some(job) => Some(job.phase),
            None if state.warmed.contains(key) => Some(JobPhase::Completed),
            None if state.failed.contains(key) => Some(JobPhase::Failed),
            None => None,
        }
    }

    pub fn active_job_count(&self) -> usize {
        self.inner.state.lock().jobs.len()
    }

    pub fn coordinator(&self) -> &Arc<ResolutionCoordinator> {
        &self.inner.coordinator
    }
}

impl Drop for PreloadScheduler {
    fn drop(&mut self) {
        self.inner.root.cancel();
    }
}

impl std::fmt::Debug for PreloadScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("PreloadScheduler")
            .field("max_preload_items", &self.max_preload_items)
            .field("prefetch_bytes", &self.inner.prefetch_bytes)
            .field("active_jobs", &state.jobs.len())
            .field("warmed", &state.warmed.len())
            .field("failed", &state.failed.len())
            .field("released", &state.released)
            .finish()
    }
}
