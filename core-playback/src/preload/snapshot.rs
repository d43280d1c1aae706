//! Observable preload state

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Immutable view of the scheduler, republished after every transition.
///
/// A key is never in both `warming_keys` and `warmed_keys`: the move from
/// one to the other happens in a single publish.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreloadSnapshot {
    /// Keys with a job in flight
    pub warming_keys: BTreeSet<String>,
    /// Keys whose URL is resolved and prefix is stored
    pub warmed_keys: BTreeSet<String>,
    /// Most recently launched job still in flight
    pub active_key: Option<String>,
}

impl PreloadSnapshot {
    pub fn is_idle(&self) -> bool {
        self.warming_keys.is_empty()
    }

    pub fn is_warming(&self, key: &str) -> bool {
        self.warming_keys.contains(key)
    }

    pub fn is_warmed(&self, key: &str) -> bool {
        self.warmed_keys.contains(key)
    }
}

/// What a window update changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowUpdate {
    /// Keys the scheduler wants warm, in launch order. Empty when the
    /// update was ignored because the current item is absent or ineligible.
    pub targets: Vec<String>,
    /// Keys for which a job was launched by this update
    pub launched: Vec<String>,
    /// Keys whose job was cancelled or warmed state dropped
    pub cancelled: Vec<String>,
}

impl WindowUpdate {
    /// Returns `true` if the update neither launched nor cancelled anything.
    pub fn is_unchanged(&self) -> bool {
        self.launched.is_empty() && self.cancelled.is_empty()
    }
}
