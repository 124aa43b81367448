//! The content store: a code-keyed map with TTL expiry and capacity limits.
//!
//! Thread-safe: the map sits behind an `RwLock` held only for map mutation,
//! never across I/O. Code generation and entry reservation execute under one
//! write lock so concurrent inserts can never be assigned the same code.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use stash_protocol::Code;

use crate::clock::{Clock, SystemClock};
use crate::codegen;
use crate::error::StoreError;
use crate::expiry::{is_expired, ExpiryPolicy, FixedTtl};

/// Content held by a store entry.
pub trait Payload: Send + Sync + 'static {
    /// Size in bytes, checked against the store's size policy on insert.
    fn size_bytes(&self) -> usize;
}

impl Payload for String {
    fn size_bytes(&self) -> usize {
        self.len()
    }
}

/// Hard limits enforced by a store instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreLimits {
    /// Maximum number of live entries; `None` = uncapped.
    pub max_entries: Option<usize>,
    /// Maximum payload size in bytes; `None` = unchecked.
    pub max_payload_bytes: Option<usize>,
}

impl StoreLimits {
    /// No caps; payload growth is bounded by the caller.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn capped(max_entries: usize, max_payload_bytes: usize) -> Self {
        Self {
            max_entries: Some(max_entries),
            max_payload_bytes: Some(max_payload_bytes),
        }
    }
}

/// Observability snapshot of a capped store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreStats {
    pub count: usize,
    pub capacity: usize,
    pub utilization_percent: f64,
}

/// Point-in-time copy of an entry returned by lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct EntrySnapshot<P> {
    pub payload: P,
    pub created_at_ms: u64,
    pub expires_at_ms: u64,
    /// True once any retrieval has observed the entry. Informational only:
    /// a consumed entry stays retrievable until it expires.
    pub consumed: bool,
}

struct Entry<P> {
    payload: P,
    created_at_ms: u64,
    expires_at_ms: u64,
    consumed: bool,
}

/// Called with entries removed by lazy eviction, so owners of external
/// resources (backend bytes) can release them. Runs while the store lock is
/// held and must not block.
type EvictHook<P> = Box<dyn Fn(Code, P) + Send + Sync>;

/// Code-keyed map from 6-digit codes to entries with a fixed TTL.
pub struct ContentStore<P> {
    entries: RwLock<HashMap<Code, Entry<P>>>,
    limits: StoreLimits,
    clock: Arc<dyn Clock>,
    policy: Box<dyn ExpiryPolicy>,
    evict_hook: Option<EvictHook<P>>,
}

impl<P: Payload> ContentStore<P> {
    /// Store with the system clock and the default 10-minute TTL.
    pub fn new(limits: StoreLimits) -> Self {
        Self::with_parts(limits, Arc::new(SystemClock), Box::new(FixedTtl::default()))
    }

    /// Store with an injected clock and expiry policy (tests, alternative TTLs).
    pub fn with_parts(
        limits: StoreLimits,
        clock: Arc<dyn Clock>,
        policy: Box<dyn ExpiryPolicy>,
    ) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            limits,
            clock,
            policy,
            evict_hook: None,
        }
    }

    /// Attach a hook invoked with every lazily evicted entry.
    pub fn with_evict_hook(mut self, hook: impl Fn(Code, P) + Send + Sync + 'static) -> Self {
        self.evict_hook = Some(Box::new(hook));
        self
    }

    /// Current time according to the store's clock.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Insert a payload under a freshly generated code.
    ///
    /// Size and capacity checks run before code generation, so a rejected
    /// insert leaves no partial state. Capped stores purge expired entries
    /// first so reclaimable capacity is never counted against the cap.
    pub fn insert(&self, payload: P) -> Result<Code, StoreError> {
        self.check_size(&payload)?;
        let now = self.clock.now_ms();
        let mut entries = self.entries.write().unwrap();
        self.enforce_capacity(&mut entries, now)?;

        let code = codegen::generate(|c| entries.contains_key(c))?;
        let prior = entries.insert(code.clone(), self.make_entry(payload, now));
        debug_assert!(prior.is_none());

        tracing::debug!(code = %code, live = entries.len(), "entry inserted");
        Ok(code)
    }

    /// Insert a payload under a caller-chosen code.
    ///
    /// Used when the code must exist before the payload does (the file
    /// backend names blobs by code). Fails with [`StoreError::CodeTaken`] if
    /// the code is bound to a live entry; callers retry with a fresh code,
    /// which together with [`ContentStore::is_live`] forms an atomic
    /// compare-and-insert. An expired occupant is evicted and replaced.
    pub fn insert_with_code(&self, code: Code, payload: P) -> Result<(), StoreError> {
        self.check_size(&payload)?;
        let now = self.clock.now_ms();
        let mut entries = self.entries.write().unwrap();
        self.enforce_capacity(&mut entries, now)?;

        if let Some(existing) = entries.get(&code) {
            if !is_expired(existing.expires_at_ms, now) {
                return Err(StoreError::CodeTaken(code));
            }
            if let Some(old) = entries.remove(&code) {
                self.notify_evicted(code.clone(), old.payload);
            }
        }

        entries.insert(code.clone(), self.make_entry(payload, now));
        tracing::debug!(code = %code, live = entries.len(), "entry inserted at reserved code");
        Ok(())
    }

    /// Whether a code is bound to a non-expired entry right now.
    pub fn is_live(&self, code: &Code) -> bool {
        let now = self.clock.now_ms();
        let entries = self.entries.read().unwrap();
        entries
            .get(code)
            .is_some_and(|e| !is_expired(e.expires_at_ms, now))
    }

    /// Retrieve an entry, marking it consumed.
    ///
    /// A malformed code is `NotFound` without touching the map. An expired
    /// entry is evicted on the spot (lazy expiry) and reported `NotFound`.
    pub fn lookup(&self, code: &str) -> Result<EntrySnapshot<P>, StoreError>
    where
        P: Clone,
    {
        self.access(code, true)
    }

    /// Retrieve an entry without flipping the consumed flag (status queries).
    pub fn peek(&self, code: &str) -> Result<EntrySnapshot<P>, StoreError>
    where
        P: Clone,
    {
        self.access(code, false)
    }

    fn access(&self, code: &str, consume: bool) -> Result<EntrySnapshot<P>, StoreError>
    where
        P: Clone,
    {
        let Some(code) = Code::parse(code) else {
            return Err(StoreError::NotFound);
        };
        let now = self.clock.now_ms();
        let mut entries = self.entries.write().unwrap();

        if entries
            .get(&code)
            .is_some_and(|e| is_expired(e.expires_at_ms, now))
        {
            if let Some(old) = entries.remove(&code) {
                tracing::debug!(code = %code, "expired entry evicted on lookup");
                self.notify_evicted(code, old.payload);
            }
            return Err(StoreError::NotFound);
        }

        let Some(entry) = entries.get_mut(&code) else {
            return Err(StoreError::NotFound);
        };
        if consume {
            entry.consumed = true;
        }
        Ok(EntrySnapshot {
            payload: entry.payload.clone(),
            created_at_ms: entry.created_at_ms,
            expires_at_ms: entry.expires_at_ms,
            consumed: entry.consumed,
        })
    }

    /// Remove an entry, returning its payload so the caller can release any
    /// external resources. No-op returning `None` on absent or malformed codes.
    pub fn delete(&self, code: &str) -> Option<P> {
        let code = Code::parse(code)?;
        let removed = self.entries.write().unwrap().remove(&code);
        if removed.is_some() {
            tracing::debug!(code = %code, "entry deleted");
        }
        removed.map(|e| e.payload)
    }

    /// Remove every entry expired at `now_ms`, returning how many were removed.
    ///
    /// Purely a memory-reclamation optimization: correctness never depends on
    /// sweep cadence because lookups evict lazily.
    pub fn sweep(&self, now_ms: u64) -> usize {
        self.drain_expired(now_ms).len()
    }

    /// Like [`ContentStore::sweep`] but hands the expired entries back to the
    /// caller instead of dropping them, bypassing the evict hook.
    pub fn drain_expired(&self, now_ms: u64) -> Vec<(Code, P)> {
        let mut entries = self.entries.write().unwrap();
        let expired: Vec<Code> = entries
            .iter()
            .filter(|(_, e)| is_expired(e.expires_at_ms, now_ms))
            .map(|(code, _)| code.clone())
            .collect();

        let drained: Vec<(Code, P)> = expired
            .into_iter()
            .filter_map(|code| entries.remove(&code).map(|e| (code, e.payload)))
            .collect();

        if !drained.is_empty() {
            tracing::info!(
                removed = drained.len(),
                remaining = entries.len(),
                "swept expired entries"
            );
        }
        drained
    }

    /// Entry count and utilization. Exact only between mutations.
    pub fn stats(&self) -> StoreStats {
        let count = self.entries.read().unwrap().len();
        let capacity = self.limits.max_entries.unwrap_or(0);
        let utilization_percent = if capacity > 0 {
            count as f64 * 100.0 / capacity as f64
        } else {
            0.0
        };
        StoreStats {
            count,
            capacity,
            utilization_percent,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_size(&self, payload: &P) -> Result<(), StoreError> {
        if let Some(max) = self.limits.max_payload_bytes {
            let size = payload.size_bytes();
            if size > max {
                return Err(StoreError::TooLarge { size, max });
            }
        }
        Ok(())
    }

    /// Purge expired entries and enforce the entry cap. Capped stores only;
    /// the write lock must already be held.
    fn enforce_capacity(
        &self,
        entries: &mut HashMap<Code, Entry<P>>,
        now_ms: u64,
    ) -> Result<(), StoreError> {
        let Some(capacity) = self.limits.max_entries else {
            return Ok(());
        };
        let expired: Vec<Code> = entries
            .iter()
            .filter(|(_, e)| is_expired(e.expires_at_ms, now_ms))
            .map(|(code, _)| code.clone())
            .collect();
        for code in expired {
            if let Some(old) = entries.remove(&code) {
                self.notify_evicted(code, old.payload);
            }
        }
        if entries.len() >= capacity {
            return Err(StoreError::CapacityExceeded { capacity });
        }
        Ok(())
    }

    fn make_entry(&self, payload: P, now_ms: u64) -> Entry<P> {
        Entry {
            payload,
            created_at_ms: now_ms,
            expires_at_ms: self.policy.expires_at(now_ms),
            consumed: false,
        }
    }

    fn notify_evicted(&self, code: Code, payload: P) {
        if let Some(hook) = &self.evict_hook {
            hook(code, payload);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::clock::ManualClock;

    const TTL_MS: u64 = 600_000;

    fn manual_store(limits: StoreLimits) -> (ContentStore<String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let store = ContentStore::with_parts(
            limits,
            clock.clone(),
            Box::new(FixedTtl::new(Duration::from_millis(TTL_MS))),
        );
        (store, clock)
    }

    #[test]
    fn insert_returns_six_digit_code() {
        let (store, _clock) = manual_store(StoreLimits::unbounded());
        let code = store.insert("hello".to_string()).unwrap();
        assert_eq!(code.as_str().len(), 6);
        assert!(code.as_str().bytes().all(|b| b.is_ascii_digit()));
    }

    #[test]
    fn lookup_returns_content_and_flips_consumed() {
        let (store, _clock) = manual_store(StoreLimits::unbounded());
        let code = store.insert("hello".to_string()).unwrap();

        let snap = store.lookup(code.as_str()).unwrap();
        assert_eq!(snap.payload, "hello");
        assert!(snap.consumed);

        // No single-use enforcement: a consumed entry stays retrievable.
        let again = store.lookup(code.as_str()).unwrap();
        assert_eq!(again.payload, "hello");
        assert!(again.consumed);
    }

    #[test]
    fn peek_does_not_consume() {
        let (store, _clock) = manual_store(StoreLimits::unbounded());
        let code = store.insert("hello".to_string()).unwrap();

        assert!(!store.peek(code.as_str()).unwrap().consumed);
        assert!(!store.peek(code.as_str()).unwrap().consumed);

        store.lookup(code.as_str()).unwrap();
        assert!(store.peek(code.as_str()).unwrap().consumed);
    }

    #[test]
    fn malformed_code_is_not_found() {
        let (store, _clock) = manual_store(StoreLimits::unbounded());
        store.insert("hello".to_string()).unwrap();

        for bad in ["", "12345", "1234567", "abc123", "12 456"] {
            assert_eq!(store.lookup(bad).unwrap_err(), StoreError::NotFound);
        }
    }

    #[test]
    fn unknown_code_is_not_found() {
        let (store, _clock) = manual_store(StoreLimits::unbounded());
        assert_eq!(store.lookup("123456").unwrap_err(), StoreError::NotFound);
    }

    #[test]
    fn expired_entry_is_lazily_evicted() {
        let (store, clock) = manual_store(StoreLimits::unbounded());
        let code = store.insert("hello".to_string()).unwrap();

        clock.advance(TTL_MS - 1);
        assert!(store.lookup(code.as_str()).is_ok());

        clock.advance(1);
        assert_eq!(
            store.lookup(code.as_str()).unwrap_err(),
            StoreError::NotFound
        );
        // The evicted entry is gone from the map despite never being swept.
        assert!(store.is_empty());
    }

    #[test]
    fn expired_code_may_be_reused() {
        let (store, clock) = manual_store(StoreLimits::unbounded());
        let code = store.insert("first".to_string()).unwrap();
        clock.advance(TTL_MS);

        store
            .insert_with_code(code.clone(), "second".to_string())
            .unwrap();
        assert_eq!(store.lookup(code.as_str()).unwrap().payload, "second");
    }

    #[test]
    fn insert_with_code_rejects_live_occupant() {
        let (store, _clock) = manual_store(StoreLimits::unbounded());
        let code = store.insert("first".to_string()).unwrap();

        let err = store
            .insert_with_code(code.clone(), "second".to_string())
            .unwrap_err();
        assert_eq!(err, StoreError::CodeTaken(code.clone()));
        assert_eq!(store.lookup(code.as_str()).unwrap().payload, "first");
    }

    #[test]
    fn too_large_payload_is_rejected_without_state_change() {
        let (store, _clock) = manual_store(StoreLimits::capped(10, 8));
        let err = store.insert("123456789".to_string()).unwrap_err();
        assert_eq!(err, StoreError::TooLarge { size: 9, max: 8 });
        assert!(store.is_empty());
    }

    #[test]
    fn capacity_is_enforced_before_code_generation() {
        let (store, _clock) = manual_store(StoreLimits::capped(3, 1024));
        for _ in 0..3 {
            store.insert("x".to_string()).unwrap();
        }
        let err = store.insert("overflow".to_string()).unwrap_err();
        assert_eq!(err, StoreError::CapacityExceeded { capacity: 3 });
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn sweep_frees_capacity() {
        let (store, clock) = manual_store(StoreLimits::capped(2, 1024));
        store.insert("a".to_string()).unwrap();
        store.insert("b".to_string()).unwrap();
        assert!(store.insert("c".to_string()).is_err());

        clock.advance(TTL_MS);
        assert_eq!(store.sweep(clock.now_ms()), 2);
        assert!(store.insert("c".to_string()).is_ok());
    }

    #[test]
    fn capped_insert_reclaims_expired_entries_inline() {
        // Even without an explicit sweep, expired entries don't count
        // against the cap.
        let (store, clock) = manual_store(StoreLimits::capped(2, 1024));
        store.insert("a".to_string()).unwrap();
        store.insert("b".to_string()).unwrap();

        clock.advance(TTL_MS);
        store.insert("c".to_string()).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn sweep_removes_only_expired() {
        let (store, clock) = manual_store(StoreLimits::unbounded());
        let old = store.insert("old".to_string()).unwrap();
        clock.advance(TTL_MS / 2);
        let young = store.insert("young".to_string()).unwrap();

        clock.advance(TTL_MS / 2);
        assert_eq!(store.sweep(clock.now_ms()), 1);
        assert_eq!(store.lookup(old.as_str()).unwrap_err(), StoreError::NotFound);
        assert!(store.lookup(young.as_str()).is_ok());
    }

    #[test]
    fn sweep_on_empty_store_removes_nothing() {
        let (store, clock) = manual_store(StoreLimits::unbounded());
        assert_eq!(store.sweep(clock.now_ms()), 0);
    }

    #[test]
    fn delete_returns_payload() {
        let (store, _clock) = manual_store(StoreLimits::unbounded());
        let code = store.insert("hello".to_string()).unwrap();

        assert_eq!(store.delete(code.as_str()), Some("hello".to_string()));
        assert_eq!(store.delete(code.as_str()), None);
        assert_eq!(store.delete("not-a-code"), None);
    }

    #[test]
    fn stats_reports_utilization() {
        let (store, _clock) = manual_store(StoreLimits::capped(4, 1024));
        store.insert("a".to_string()).unwrap();
        store.insert("b".to_string()).unwrap();

        let stats = store.stats();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.capacity, 4);
        assert!((stats.utilization_percent - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn evict_hook_fires_on_lazy_eviction() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let clock = Arc::new(ManualClock::new(0));
        let evicted = Arc::new(AtomicUsize::new(0));
        let counter = evicted.clone();
        let store: ContentStore<String> = ContentStore::with_parts(
            StoreLimits::unbounded(),
            clock.clone(),
            Box::new(FixedTtl::new(Duration::from_millis(TTL_MS))),
        )
        .with_evict_hook(move |_code, _payload| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let code = store.insert("hello".to_string()).unwrap();
        clock.advance(TTL_MS);
        let _ = store.lookup(code.as_str());
        assert_eq!(evicted.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drain_expired_bypasses_hook_and_returns_payloads() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let clock = Arc::new(ManualClock::new(0));
        let evicted = Arc::new(AtomicUsize::new(0));
        let counter = evicted.clone();
        let store: ContentStore<String> = ContentStore::with_parts(
            StoreLimits::unbounded(),
            clock.clone(),
            Box::new(FixedTtl::new(Duration::from_millis(TTL_MS))),
        )
        .with_evict_hook(move |_code, _payload| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let code = store.insert("hello".to_string()).unwrap();
        clock.advance(TTL_MS);

        let drained = store.drain_expired(clock.now_ms());
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].0, code);
        assert_eq!(drained[0].1, "hello");
        assert_eq!(evicted.load(Ordering::SeqCst), 0);
    }
}
