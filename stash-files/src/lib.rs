//! Byte storage backends, ZIP packaging, and the file sharing service.

pub mod archive;
pub mod backend;
pub mod service;

pub use backend::{BackendError, BlobHandle, ByteStorage, DiskStorage, MemoryStorage};
pub use service::{FileSharing, ServiceError, StoredFile, ZIP_NAME};
