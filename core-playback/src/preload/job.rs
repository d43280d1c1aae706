//! Preload job identity and lifecycle

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier of one warming attempt.
///
/// A key that leaves the window and comes back gets a new job with a new
/// id, so a stale job finishing late can be told apart from its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreloadJobId(Uuid);

impl PreloadJobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PreloadJobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PreloadJobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a warming job.
///
/// ```text
/// Resolving ──url──> Prefetching ──bytes──> Completed
///     │                  │
///     ├──no url──> Failed <──io error──┤
///     └──────cancel──> Cancelled <─────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobPhase {
    /// Obtaining a playable URL (initial)
    Resolving,
    /// Storing the stream prefix in the byte-range cache
    Prefetching,
    Completed,
    Cancelled,
    Failed,
}

impl JobPhase {
    /// Returns `true` for phases after which the job does no more work.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobPhase::Completed | JobPhase::Cancelled | JobPhase::Failed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobPhase::Resolving => "resolving",
            JobPhase::Prefetching => "prefetching",
            JobPhase::Completed => "completed",
            JobPhase::Cancelled => "cancelled",
            JobPhase::Failed => "failed",
        }
    }
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a job ended.
#[derive(Debug)]
pub(crate) enum JobOutcome {
    Completed { bytes: u64 },
    Cancelled,
    Failed(PlaybackError),
}

impl From<Result<u64>> for JobOutcome {
    fn from(result: Result<u64>) -> Self {
        match result {
            Ok(bytes) => JobOutcome::Completed { bytes },
            Err(err) if err.is_cancellation() => JobOutcome::Cancelled,
            Err(err) => JobOutcome::Failed(err),
        }
    }
}
