//! # Event Bus System
//!
//! Broadcast channel for notifications emitted by the preload subsystem.
//!
//! ## Overview
//!
//! - **Event Types**: [`CoreEvent`] wraps per-domain enums ([`PreloadEvent`],
//!   [`StreamCacheEvent`])
//! - **EventBus**: central broadcast sender; cheap to share behind `Arc`
//! - **EventStream**: receiver wrapper with an optional predicate
//!
//! Emission is best-effort. `emit` returns an error when nobody is
//! subscribed, which publishers are expected to ignore.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, PreloadEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(64);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(CoreEvent::Preload(PreloadEvent::JobCancelled {
//!     job_id: "5b0c".to_string(),
//!     key: "yt:dQw4w9WgXcQ".to_string(),
//! }))
//! .ok();
//!
//! let event = rx.recv().await.unwrap();
//! assert!(matches!(event, CoreEvent::Preload(_)));
//! # }
//! ```
//!
//! ## Lagging subscribers
//!
//! A subscriber that falls more than `capacity` events behind receives
//! `RecvError::Lagged(n)` and then continues with newer events. `Closed`
//! means the bus was dropped.

use core_async::sync::broadcast;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use core_async::sync::broadcast::error::{RecvError, SendError};
pub use core_async::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Top-level event published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Preload window and job lifecycle
    Preload(PreloadEvent),
    /// Stream URL cache maintenance
    StreamCache(StreamCacheEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Preload(e) => e.description(),
            CoreEvent::StreamCache(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    ///
    /// Nothing here is ever an error: a failed preload only costs latency.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Preload(PreloadEvent::JobFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Preload(PreloadEvent::JobCompleted { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Preload Events
// ============================================================================

/// Events emitted by the preload scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PreloadEvent {
    /// A window reconciliation finished.
    WindowUpdated {
        /// Keys the scheduler now wants warm, in launch order.
        target_keys: Vec<String>,
        /// Keys for which a new job was started.
        launched: Vec<String>,
        /// Keys whose job or warmed state was dropped.
        cancelled: Vec<String>,
    },
    /// A warming job was launched.
    JobStarted { job_id: String, key: String },
    /// URL resolved and byte prefix stored.
    JobCompleted {
        job_id: String,
        key: String,
        /// Bytes the prefetch call reported storing.
        bytes: u64,
    },
    /// Resolution or prefetch failed. The key stays cold.
    JobFailed {
        job_id: String,
        key: String,
        message: String,
    },
    /// The job was cancelled by window reconciliation or shutdown.
    JobCancelled { job_id: String, key: String },
}

impl PreloadEvent {
    fn description(&self) -> &str {
        match self {
            PreloadEvent::WindowUpdated { .. } => "Preload window updated",
            PreloadEvent::JobStarted { .. } => "Preload job started",
            PreloadEvent::JobCompleted { .. } => "Preload job completed",
            PreloadEvent::JobFailed { .. } => "Preload job failed",
            PreloadEvent::JobCancelled { .. } => "Preload job cancelled",
        }
    }

    /// Key the event refers to, if it concerns a single item.
    pub fn key(&self) -> Option<&str> {
        match self {
            PreloadEvent::WindowUpdated { .. } => None,
            PreloadEvent::JobStarted { key, .. }
            | PreloadEvent::JobCompleted { key, .. }
            | PreloadEvent::JobFailed { key, .. }
            | PreloadEvent::JobCancelled { key, .. } => Some(key),
        }
    }
}

// ============================================================================
// Stream Cache Events
// ============================================================================

/// Events emitted by the stream URL cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum StreamCacheEvent {
    /// A live entry was dropped to make room for a new key.
    Evicted { key: String },
    /// A cached URL was discarded because playback reported it unusable.
    Invalidated { key: String },
}

impl StreamCacheEvent {
    fn description(&self) -> &str {
        match self {
            StreamCacheEvent::Evicted { .. } => "Stream URL evicted",
            StreamCacheEvent::Invalidated { .. } => "Stream URL invalidated",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus.
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a receiver for all future events. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` that skips events rejected by a predicate.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let bus = EventBus::new(16);
/// let preload_only = EventStream::new(bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Preload(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// `RecvError::Lagged(n)` if the subscriber fell behind by `n` events,
    /// `RecvError::Closed` once the bus is gone.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Returns the next buffered event that passes the filter, without waiting.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}
