//! Periodic sweep of expired entries.
//!
//! Purely a memory/disk reclamation optimization: lookups evict expired
//! entries lazily, so nothing depends on sweep cadence.

use std::sync::Arc;
use std::time::Duration;

use stash_files::FileSharing;
use stash_store::ContentStore;
use tokio::task::JoinHandle;

#[derive(Debug, PartialEq, Eq)]
pub struct SweepReport {
    pub files_removed: usize,
    pub texts_removed: usize,
}

/// Run one sweep over both stores at their clocks' current time.
pub async fn sweep_once(files: &FileSharing, texts: &ContentStore<String>) -> SweepReport {
    let files_removed = files.sweep().await;
    let texts_removed = texts.sweep(texts.now_ms());
    if files_removed + texts_removed > 0 {
        tracing::info!(files_removed, texts_removed, "periodic sweep reclaimed entries");
    }
    SweepReport {
        files_removed,
        texts_removed,
    }
}

/// Spawn the recurring sweep task.
pub fn spawn(
    files: Arc<FileSharing>,
    texts: Arc<ContentStore<String>>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // The immediate first tick would sweep an empty store.
        interval.tick().await;
        loop {
            interval.tick().await;
            sweep_once(&files, &texts).await;
        }
    })
}
