//! Collision-free code generation.

use rand::Rng;
use stash_protocol::Code;

use crate::error::StoreError;

/// Attempt bound for code generation. Collision probability per draw is at
/// most `live_entries / 1_000_000`.
pub const MAX_ATTEMPTS: usize = 10;

/// Draw a uniformly random 6-digit code not currently live.
///
/// `is_live` is evaluated against the caller's view of the store; the caller
/// is responsible for making the check-and-reserve sequence atomic (the store
/// runs this under its write lock).
pub fn generate(is_live: impl Fn(&Code) -> bool) -> Result<Code, StoreError> {
    let mut rng = rand::rng();
    for _ in 0..MAX_ATTEMPTS {
        let code = Code::from_index(rng.random_range(0..Code::SPACE));
        if !is_live(&code) {
            return Ok(code);
        }
    }
    Err(StoreError::ExhaustedRetries {
        attempts: MAX_ATTEMPTS,
    })
}
