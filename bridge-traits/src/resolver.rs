//! Stream URL resolution
//!
//! Turns a catalog item identifier into a playable network URL. The actual
//! protocol lives in the host (a third-party extractor); the core only
//! decides when to call it and how long to trust its answer.

use crate::{error::Result, platform::PlatformSendSync};
use serde::{Deserialize, Serialize};

/// A playable stream returned by a resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedStream {
    /// Direct media URL. Usually signed and short-lived.
    pub url: String,
    /// Extractor-specific format identifier (e.g. an itag), if known.
    pub format: Option<String>,
    /// Average audio bitrate in kbps, if known.
    pub bitrate_kbps: Option<u32>,
}

impl ResolvedStream {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: None,
            bitrate_kbps: None,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_bitrate(mut self, kbps: u32) -> Self {
        self.bitrate_kbps = Some(kbps);
        self
    }
}

/// Resolver bridge
///
/// Implementations must be safe to call repeatedly and concurrently for
/// different keys. They do not need to enforce a deadline themselves: the
/// caller drops the returned future when its own timeout fires, so any
/// in-flight request must tolerate being abandoned at an `.await` point.
///
/// # Errors
///
/// Network failures map to [`BridgeError::Network`](crate::BridgeError::Network),
/// unexpected payloads to [`BridgeError::Parse`](crate::BridgeError::Parse).
#[async_trait::async_trait]
pub trait StreamResolver: PlatformSendSync {
    /// Resolve a playable stream for `key`.
    async fn resolve(&self, key: &str) -> Result<ResolvedStream>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "resolver"
    }
}
