//! Preload window planning
//!
//! Computes which items should be warm for a given playback position.
//! Targets are recomputed on every window update and never stored.

use bridge_traits::QueueItem;
use std::collections::HashSet;

/// Decides whether an item goes through the preload path at all.
///
/// Local files need no warming; typically only streamed items qualify.
/// Implemented for plain closures:
///
/// ```rust
/// use bridge_traits::QueueItem;
/// use core_playback::preload::PreloadEligibility;
///
/// let only_youtube = |item: &QueueItem| item.key.starts_with("yt:");
/// assert!(only_youtube.is_eligible(&QueueItem::remote("yt:1")));
/// ```
pub trait PreloadEligibility: Send + Sync {
    fn is_eligible(&self, item: &QueueItem) -> bool;
}

impl<F> PreloadEligibility for F
where
    F: Fn(&QueueItem) -> bool + Send + Sync,
{
    fn is_eligible(&self, item: &QueueItem) -> bool {
        self(item)
    }
}

/// Eligibility that accepts remote items only.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoteOnly;

impl PreloadEligibility for RemoteOnly {
    fn is_eligible(&self, item: &QueueItem) -> bool {
        item.is_remote()
    }
}

/// Why an item is in the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetRole {
    Previous,
    /// Position among the upcoming items, 0 being next
    Upcoming(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadTarget {
    pub key: String,
    pub role: TargetRole,
}

/// Build the ordered target list for a playback position.
///
/// Returns `None` when `current` is absent or ineligible, meaning the
/// window should be left as it is. Otherwise the list holds the previous
/// item (if eligible) followed by the eligible items among the first
/// `max_upcoming` upcoming ones. A key appears at most once.
pub fn plan_window(
    current: Option<&QueueItem>,
    upcoming: &[QueueItem],
    previous: Option<&QueueItem>,
    max_upcoming: usize,
    eligibility: &dyn PreloadEligibility,
) -> Option<Vec<PreloadTarget>> {
    let current = current?;
    if !eligibility.is_eligible(current) {
        return None;
    }

    let previous = previous
        .filter(|item| eligibility.is_eligible(item))
        .map(|item| (item, TargetRole::Previous));
    let ahead = upcoming
        .iter()
        .take(max_upcoming)
        .enumerate()
        .filter(|(_, item)| eligibility.is_eligible(item))
        .map(|(rank, item)| (item, TargetRole::Upcoming(rank)));

    let mut seen = HashSet::new();
    let targets = previous
        .into_iter()
        .chain(ahead)
        .filter(|(item, _)| seen.insert(item.key.clone()))
        .map(|(item, role)| PreloadTarget {
            key: item.key.clone(),
            role,
        })
        .collect();

    Some(targets)
}
