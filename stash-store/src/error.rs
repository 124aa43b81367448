//! Typed store errors.
//!
//! Every failure mode of the store is a value; the HTTP layer maps them to
//! status codes. `CapacityExceeded` and `ExhaustedRetries` are transient
//! server-side conditions (retryable later), the rest are client errors.

use stash_protocol::Code;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Payload rejected by the size policy before any state change.
    #[error("payload of {size} bytes exceeds the maximum of {max} bytes")]
    TooLarge { size: usize, max: usize },

    /// The store is at its hard entry cap.
    #[error("storage limit of {capacity} entries reached")]
    CapacityExceeded { capacity: usize },

    /// No unused code found within the attempt bound.
    #[error("unable to generate an unused code after {attempts} attempts")]
    ExhaustedRetries { attempts: usize },

    /// The requested code is already bound to a live entry.
    #[error("code {0} is already bound to a live entry")]
    CodeTaken(Code),

    /// Absent, malformed, or lazily-expired code.
    #[error("invalid or expired code")]
    NotFound,
}
