use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use orbit_common::ConfigResolution;
use tokio::time::Instant;

#[derive(Debug)]
pub struct CachedConfig {
    pub value: Arc<ConfigResolution>,
    pub expires_at: Instant,
}

/// Holds at most one resolved config; expiry is the only eviction.
pub trait ConfigCache: Send + Sync {
    /// The cached value while `now < expires_at`.
    fn get(&self) -> Option<Arc<ConfigResolution>>;
    fn set(&self, value: Arc<ConfigResolution>, ttl: Duration);
}

/// Lock-free cache slot: writers swap in a fully built entry in one store.
#[derive(Debug, Default)]
pub struct TtlConfigCache {
    slot: ArcSwapOption<CachedConfig>,
}

impl TtlConfigCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigCache for TtlConfigCache {
    fn get(&self) -> Option<Arc<ConfigResolution>> {
        let entry = self.slot.load_full()?;
        if Instant::now() < entry.expires_at {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    fn set(&self, value: Arc<ConfigResolution>, ttl: Duration) {
        self.slot.store(Some(Arc::new(CachedConfig {
            value,
            expires_at: Instant::now() + ttl,
        })));
    }
}
