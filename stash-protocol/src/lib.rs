//! Shared codes, limits, and API payload types for stash.

pub mod api;
pub mod code;
pub mod limits;

pub use code::Code;
