//! Catalog items as seen by the playback queue.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where an item's audio comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemSource {
    /// Streamed from a remote service; needs URL resolution before playback.
    Remote,
    /// A file on the device.
    Local { path: PathBuf },
}

/// One entry of the playback queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    /// Opaque identifier shared by the URL cache and the byte cache.
    pub key: String,
    pub source: ItemSource,
}

impl QueueItem {
    pub fn remote(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            source: ItemSource::Remote,
        }
    }

    pub fn local(key: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            source: ItemSource::Local { path: path.into() },
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.source, ItemSource::Remote)
    }
}
