//! Time-to-live policy applied at insertion time.

use std::time::Duration;

/// Default entry lifetime: 10 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

/// Computes the expiry timestamp for an entry inserted at `now_ms`.
///
/// Injected into the store so per-entry or per-kind TTL schemes can be
/// substituted without touching store logic.
pub trait ExpiryPolicy: Send + Sync {
    fn expires_at(&self, now_ms: u64) -> u64;
}

/// One fixed TTL for every entry.
#[derive(Debug, Clone, Copy)]
pub struct FixedTtl {
    ttl_ms: u64,
}

impl FixedTtl {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl_ms: ttl.as_millis() as u64,
        }
    }
}

impl Default for FixedTtl {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ExpiryPolicy for FixedTtl {
    fn expires_at(&self, now_ms: u64) -> u64 {
        now_ms + self.ttl_ms
    }
}

/// An entry whose expiry timestamp has been reached is expired.
pub fn is_expired(expires_at_ms: u64, now_ms: u64) -> bool {
    expires_at_ms <= now_ms
}
