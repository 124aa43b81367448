//! Byte storage backends.
//!
//! The content store owns entry metadata; a [`ByteStorage`] backend owns the
//! raw bytes and hands out opaque handles. Blobs are stored under
//! `<code>_<filename>` so two uploads of the same file never collide unless
//! they were also assigned the same code.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Mutex;

use async_trait::async_trait;
use stash_protocol::Code;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

/// Boxed reader returned by [`ByteStorage::open`].
pub type ByteReader = Pin<Box<dyn AsyncRead + Send + Sync>>;

#[derive(Debug, Error)]
pub enum BackendError {
    /// The handle no longer names stored bytes.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// A blob with this name already exists (code/name collision).
    #[error("blob already exists: {0}")]
    AlreadyExists(String),

    /// The display name has no usable final path component.
    #[error("unusable file name: {0:?}")]
    InvalidName(String),

    #[error("storage i/o failed: {0}")]
    Io(#[from] io::Error),
}

/// Opaque reference to stored bytes, owned by the backend that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobHandle(String);

impl BlobHandle {
    pub fn new(inner: impl Into<String>) -> Self {
        Self(inner.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Persists and streams raw content bytes keyed by opaque handles.
#[async_trait]
pub trait ByteStorage: Send + Sync {
    /// Persist `bytes` under `<code>_<file_name>` and return a handle.
    ///
    /// Fails with [`BackendError::AlreadyExists`] rather than overwrite, so
    /// a code collision can never clobber another upload's bytes.
    async fn save(
        &self,
        code: &Code,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<BlobHandle, BackendError>;

    /// Open the blob for streaming.
    async fn open(&self, handle: &BlobHandle) -> Result<ByteReader, BackendError>;

    /// Delete the blob. Deleting an already-absent blob is a no-op.
    async fn remove(&self, handle: &BlobHandle) -> Result<(), BackendError>;

    /// Read the whole blob into memory.
    async fn read(&self, handle: &BlobHandle) -> Result<Vec<u8>, BackendError> {
        let mut reader = self.open(handle).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }
}

/// Reduce a client-supplied display name to its final path component.
///
/// Multipart filenames can carry directory prefixes; only the bare name is
/// ever used on disk.
fn storage_name(file_name: &str) -> Result<&str, BackendError> {
    Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty() && *n != "." && *n != "..")
        .ok_or_else(|| BackendError::InvalidName(file_name.to_string()))
}

/// Filesystem-backed storage under a single upload directory.
pub struct DiskStorage {
    upload_dir: PathBuf,
}

impl DiskStorage {
    /// Create the upload directory if needed and return the backend.
    pub async fn new(upload_dir: PathBuf) -> Result<Self, BackendError> {
        tokio::fs::create_dir_all(&upload_dir).await?;
        tracing::info!(upload_dir = %upload_dir.display(), "disk storage ready");
        Ok(Self { upload_dir })
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }
}

#[async_trait]
impl ByteStorage for DiskStorage {
    async fn save(
        &self,
        code: &Code,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<BlobHandle, BackendError> {
        let name = storage_name(file_name)?;
        let path = self.upload_dir.join(format!("{code}_{name}"));

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                if e.kind() == io::ErrorKind::AlreadyExists {
                    BackendError::AlreadyExists(path.display().to_string())
                } else {
                    BackendError::Io(e)
                }
            })?;
        file.write_all(bytes).await?;
        file.flush().await?;

        tracing::debug!(path = %path.display(), size = bytes.len(), "blob written");
        Ok(BlobHandle::new(path.display().to_string()))
    }

    async fn open(&self, handle: &BlobHandle) -> Result<ByteReader, BackendError> {
        let file = tokio::fs::File::open(handle.as_str())
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => BackendError::NotFound(handle.as_str().to_string()),
                _ => BackendError::Io(e),
            })?;
        Ok(Box::pin(file))
    }

    async fn remove(&self, handle: &BlobHandle) -> Result<(), BackendError> {
        match tokio::fs::remove_file(handle.as_str()).await {
            Ok(()) => {
                tracing::debug!(path = %handle.as_str(), "blob removed");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BackendError::Io(e)),
        }
    }
}

/// In-memory storage for tests.
#[derive(Default)]
pub struct MemoryStorage {
    blobs: Mutex<HashMap<BlobHandle, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blob_count(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }
}

#[async_trait]
impl ByteStorage for MemoryStorage {
    async fn save(
        &self,
        code: &Code,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<BlobHandle, BackendError> {
        let name = storage_name(file_name)?;
        let handle = BlobHandle::new(format!("{code}_{name}"));
        let mut blobs = self.blobs.lock().unwrap();
        if blobs.contains_key(&handle) {
            return Err(BackendError::AlreadyExists(handle.as_str().to_string()));
        }
        blobs.insert(handle.clone(), bytes.to_vec());
        Ok(handle)
    }

    async fn open(&self, handle: &BlobHandle) -> Result<ByteReader, BackendError> {
        let bytes = self
            .blobs
            .lock()
            .unwrap()
            .get(handle)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(handle.as_str().to_string()))?;
        Ok(Box::pin(std::io::Cursor::new(bytes)))
    }

    async fn remove(&self, handle: &BlobHandle) -> Result<(), BackendError> {
        self.blobs.lock().unwrap().remove(handle);
        Ok(())
    }
}
