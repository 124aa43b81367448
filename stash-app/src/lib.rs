//! HTTP server for code-based file and text sharing.

pub mod handlers;
pub mod server;
pub mod settings;
pub mod state;
pub mod sweeper;
