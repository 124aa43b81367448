//! File sharing service: content store + byte backend + ZIP packaging.
//!
//! Uploads are all-or-nothing: bytes are persisted first, then the entry is
//! registered; a backend failure aborts with nothing registered, and a code
//! collision discovered at registration rolls the bytes back and retries
//! with a fresh code.

use std::sync::Arc;

use stash_protocol::Code;
use stash_store::{
    codegen, Clock, ContentStore, EntrySnapshot, FixedTtl, Payload, StoreError, StoreLimits,
    SystemClock,
};
use thiserror::Error;

use crate::archive::{self, ArchiveError};
use crate::backend::{BackendError, BlobHandle, ByteReader, ByteStorage};

/// Display name given to a packed multi-file upload.
pub const ZIP_NAME: &str = "files.zip";

/// Metadata stored per shared file; the bytes live in the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub display_name: String,
    pub handle: BlobHandle,
    pub size: u64,
}

impl Payload for StoredFile {
    fn size_bytes(&self) -> usize {
        self.size as usize
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("archive packing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ServiceError {
    /// True when the code or its bytes are gone (HTTP 404 territory).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Store(StoreError::NotFound) | Self::Backend(BackendError::NotFound(_))
        )
    }
}

/// Shares files behind 6-digit codes with a 10-minute lifetime.
pub struct FileSharing {
    store: ContentStore<StoredFile>,
    backend: Arc<dyn ByteStorage>,
}

impl FileSharing {
    pub fn new(backend: Arc<dyn ByteStorage>) -> Self {
        Self::with_clock(backend, Arc::new(SystemClock))
    }

    /// Service with an injected clock, for expiry tests.
    pub fn with_clock(backend: Arc<dyn ByteStorage>, clock: Arc<dyn Clock>) -> Self {
        // Lazily evicted entries release their bytes in the background; the
        // hook runs under the store lock, so the actual delete is spawned.
        let evict_backend = Arc::clone(&backend);
        let store = ContentStore::with_parts(
            StoreLimits::unbounded(),
            clock,
            Box::new(FixedTtl::default()),
        )
        .with_evict_hook(move |code, file: StoredFile| {
            let backend = Arc::clone(&evict_backend);
            tokio::spawn(async move {
                if let Err(e) = backend.remove(&file.handle).await {
                    tracing::warn!(code = %code, error = %e, "failed to remove blob of evicted entry");
                }
            });
        });

        Self { store, backend }
    }

    /// Persist one file and register it under a fresh code.
    pub async fn save_file(&self, file_name: &str, bytes: Vec<u8>) -> Result<Code, ServiceError> {
        let size = bytes.len() as u64;
        for _ in 0..codegen::MAX_ATTEMPTS {
            let code = codegen::generate(|c| self.store.is_live(c))?;

            // Bytes first: the blob must exist before anyone can look it up.
            let handle = match self.backend.save(&code, file_name, &bytes).await {
                Ok(handle) => handle,
                // Another upload owns this code's storage name; redraw.
                Err(BackendError::AlreadyExists(_)) => continue,
                Err(e) => return Err(e.into()),
            };

            let stored = StoredFile {
                display_name: file_name.to_string(),
                handle: handle.clone(),
                size,
            };
            match self.store.insert_with_code(code.clone(), stored) {
                Ok(()) => {
                    tracing::info!(code = %code, file_name, size, "file stored");
                    return Ok(code);
                }
                Err(StoreError::CodeTaken(_)) => {
                    // Lost the reservation race; roll back our bytes and redraw.
                    let _ = self.backend.remove(&handle).await;
                    continue;
                }
                Err(e) => {
                    let _ = self.backend.remove(&handle).await;
                    return Err(e.into());
                }
            }
        }
        Err(StoreError::ExhaustedRetries {
            attempts: codegen::MAX_ATTEMPTS,
        }
        .into())
    }

    /// Pack several files into one ZIP and register it under a fresh code.
    ///
    /// Zero-length inputs are skipped by the packager but still count toward
    /// the caller-reported file count.
    pub async fn save_many_as_zip(
        &self,
        files: Vec<(String, Vec<u8>)>,
    ) -> Result<Code, ServiceError> {
        let file_count = files.len();
        let archive = tokio::task::spawn_blocking(move || archive::pack(&files)).await??;
        let code = self.save_file(ZIP_NAME, archive).await?;
        tracing::info!(code = %code, file_count, "files packed and stored");
        Ok(code)
    }

    /// Look up a code (marking it downloaded) and open its bytes for streaming.
    pub async fn retrieve(
        &self,
        code: &str,
    ) -> Result<(EntrySnapshot<StoredFile>, ByteReader), ServiceError> {
        let snap = self.store.lookup(code)?;
        let reader = self.backend.open(&snap.payload.handle).await?;
        Ok((snap, reader))
    }

    /// Non-consuming status query.
    pub fn status(&self, code: &str) -> Result<EntrySnapshot<StoredFile>, ServiceError> {
        Ok(self.store.peek(code)?)
    }

    /// Delete an entry and its bytes. Returns whether anything was removed.
    pub async fn delete(&self, code: &str) -> Result<bool, ServiceError> {
        match self.store.delete(code) {
            Some(file) => {
                self.backend.remove(&file.handle).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Sweep expired entries at the store clock's current time.
    pub async fn sweep(&self) -> usize {
        self.sweep_at(self.store.now_ms()).await
    }

    /// Sweep expired entries at an explicit timestamp, releasing their bytes.
    pub async fn sweep_at(&self, now_ms: u64) -> usize {
        let drained = self.store.drain_expired(now_ms);
        let removed = drained.len();
        for (code, file) in drained {
            if let Err(e) = self.backend.remove(&file.handle).await {
                tracing::warn!(code = %code, error = %e, "failed to remove blob of swept entry");
            }
        }
        removed
    }

    /// Number of registered entries, expired-but-unswept included.
    pub fn live_entries(&self) -> usize {
        self.store.len()
    }
}
