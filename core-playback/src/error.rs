//! # Playback Error Types
//!
//! Errors raised inside the stream preload core.
//!
//! Resolution and prefetch errors never reach the hosting application as a
//! failure: the coordinator turns them into an absent URL and the scheduler
//! turns them into terminal job phases. Only configuration and
//! `SchedulerReleased` are returned to the caller.

use thiserror::Error;

/// Errors that can occur while resolving or warming a stream.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Resolution Errors
    // ========================================================================
    /// The resolver reported a failure.
    #[error("Stream resolution failed for {key}: {message}")]
    ResolutionFailed { key: String, message: String },

    /// The resolver did not answer within the configured budget.
    #[error("Stream resolution timed out for {key} after {timeout:?}")]
    ResolutionTimeout {
        key: String,
        timeout: std::time::Duration,
    },

    /// The resolver answered with an empty URL.
    #[error("Resolver returned an empty URL for {0}")]
    EmptyResolution(String),

    // ========================================================================
    // Prefetch Errors
    // ========================================================================
    /// The byte-range cache could not store the stream prefix.
    #[error("Prefetch failed for {key}: {message}")]
    PrefetchFailed { key: String, message: String },

    // ========================================================================
    // Scheduler Errors
    // ========================================================================
    /// The job's cancellation token fired before it finished.
    #[error("Preload cancelled")]
    Cancelled,

    /// The scheduler has been released and accepts no more work.
    #[error("Preload scheduler has been released")]
    SchedulerReleased,

    // ========================================================================
    // Generic Errors
    // ========================================================================
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A preload job panicked.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Returns `true` if a later attempt for the same key may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            PlaybackError::ResolutionFailed { .. }
            | PlaybackError::ResolutionTimeout { .. }
            | PlaybackError::PrefetchFailed { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` for deliberate terminations, which are not failures.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, PlaybackError::Cancelled)
    }
}

/// Result type for preload operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
