use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{BridgeError, ResolvedStream, StreamResolver};
use std::sync::Arc;
use tracing::debug;

/// Tries an ordered chain of resolvers and returns the first usable answer.
///
/// Third-party extractors break without notice, so hosts usually pair a
/// primary extractor with a secondary one. An empty URL counts as a
/// failure and moves on to the next resolver. When every resolver fails,
/// the last error is returned.
///
/// ```ignore
/// let resolver = FallbackResolver::new(Arc::new(PrimaryExtractor))
///     .with_fallback(Arc::new(SecondaryExtractor));
/// ```
pub struct FallbackResolver {
    chain: Vec<Arc<dyn StreamResolver>>,
}

impl FallbackResolver {
    pub fn new(primary: Arc<dyn StreamResolver>) -> Self {
        Self {
            chain: vec![primary],
        }
    }

    /// Append a resolver tried after all earlier ones failed.
    pub fn with_fallback(mut self, resolver: Arc<dyn StreamResolver>) -> Self {
        self.chain.push(resolver);
        self
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }
}

#[async_trait::async_trait]
impl StreamResolver for FallbackResolver {
    async fn resolve(&self, key: &str) -> BridgeResult<ResolvedStream> {
        let mut last_error =
            BridgeError::NotAvailable("no stream resolver configured".to_string());

        for (attempt, resolver) in self.chain.iter().enumerate() {
            match resolver.resolve(key).await {
                Ok(stream) if !stream.url.trim().is_empty() => {
                    if attempt > 0 {
                        debug!(
                            key,
                            resolver = resolver.name(),
                            attempt,
                            "Fallback resolver succeeded"
                        );
                    }
                    return Ok(stream);
                }
                Ok(_) => {
                    last_error =
                        BridgeError::Parse(format!("{} returned an empty URL", resolver.name()));
                }
                Err(err) => {
                    debug!(key, resolver = resolver.name(), error = %err, "Resolver failed");
                    last_error = err;
                }
            }
        }

        Err(last_error)
    }

    fn name(&self) -> &str {
        "fallback"
    }
}

impl std::fmt::Debug for FallbackResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.chain.iter().map(|r| r.name()).collect();
        f.debug_struct("FallbackResolver")
            .field("chain", &names)
            .finish()
    }
}
