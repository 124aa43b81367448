//! Shared handler state.
//!
//! The two stores are independent instances with independent code
//! namespaces: one for file metadata, one for texts. They are passed in
//! explicitly rather than living in process-wide globals.

use std::sync::Arc;

use stash_files::FileSharing;
use stash_protocol::limits::{MAX_STORED_TEXTS, MAX_TEXT_BYTES};
use stash_store::{ContentStore, StoreLimits};

#[derive(Clone)]
pub struct AppState {
    pub files: Arc<FileSharing>,
    pub texts: Arc<ContentStore<String>>,
}

impl AppState {
    pub fn new(files: Arc<FileSharing>, texts: Arc<ContentStore<String>>) -> Self {
        Self { files, texts }
    }
}

/// Text store with the production caps: 1000 entries, 2 MiB each.
pub fn text_store() -> ContentStore<String> {
    ContentStore::new(StoreLimits::capped(MAX_STORED_TEXTS, MAX_TEXT_BYTES))
}
