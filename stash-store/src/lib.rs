//! Ephemeral code-keyed content store.
//!
//! The store maps 6-digit numeric codes to entries with a fixed time-to-live.
//! Codes are minted collision-free against the set of currently live entries,
//! expired entries are evicted lazily on lookup and in bulk by [`store::ContentStore::sweep`],
//! and capped stores enforce a hard entry count before insertion.

pub mod clock;
pub mod codegen;
pub mod error;
pub mod expiry;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::StoreError;
pub use expiry::{is_expired, ExpiryPolicy, FixedTtl, DEFAULT_TTL};
pub use store::{ContentStore, EntrySnapshot, Payload, StoreLimits, StoreStats};
