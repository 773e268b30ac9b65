use std::time::Duration;
use tokio::time::Instant;

/// A cached value and the instant it was last stamped.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    inserted_at: Instant,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V) -> Self {
        Self { value, inserted_at: Instant::now() }
    }

    pub fn inserted_at(&self) -> Instant {
        self.inserted_at
    }

    /// Re-stamp with the current instant, extending the entry's life.
    pub fn touch(&mut self) {
        self.inserted_at = Instant::now();
    }

    /// Strictly older than `lifetime` at `now`.
    #[inline]
    pub fn is_expired(&self, now: Instant, lifetime: Duration) -> bool {
        now.saturating_duration_since(self.inserted_at) > lifetime
    }
}
