//! End-to-end lifecycle of a text entry: insert, repeated views, expiry.

use std::sync::Arc;
use std::time::Duration;

use stash_protocol::Code;
use stash_store::{ContentStore, FixedTtl, ManualClock, StoreError, StoreLimits};

const TTL: Duration = Duration::from_secs(600);

#[test]
fn text_entry_lifecycle() {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let store: ContentStore<String> = ContentStore::with_parts(
        StoreLimits::capped(1000, 2 * 1024 * 1024),
        clock.clone(),
        Box::new(FixedTtl::new(TTL)),
    );

    // Insert returns a well-formed code that was not live beforehand.
    let code = store.insert("hello".to_string()).unwrap();
    assert!(Code::parse(code.as_str()).is_some());

    // First view returns the content and marks it viewed.
    let snap = store.lookup(code.as_str()).unwrap();
    assert_eq!(snap.payload, "hello");
    assert!(snap.consumed);

    // Viewed is a status bit, not an access gate: still retrievable.
    let again = store.lookup(code.as_str()).unwrap();
    assert_eq!(again.payload, "hello");

    // Once the TTL elapses the entry is gone, swept or not.
    clock.advance(TTL.as_millis() as u64);
    assert_eq!(
        store.lookup(code.as_str()).unwrap_err(),
        StoreError::NotFound
    );
}

#[test]
fn expiry_timestamps_are_ttl_apart() {
    let clock = Arc::new(ManualClock::new(5_000));
    let store: ContentStore<String> = ContentStore::with_parts(
        StoreLimits::unbounded(),
        clock.clone(),
        Box::new(FixedTtl::new(TTL)),
    );

    let code = store.insert("hello".to_string()).unwrap();
    let snap = store.peek(code.as_str()).unwrap();
    assert_eq!(snap.created_at_ms, 5_000);
    assert_eq!(snap.expires_at_ms, 5_000 + TTL.as_millis() as u64);
}
