//! Request and storage limits shared between the stores and the HTTP layer.

/// Maximum UTF-8 byte length of a stored text: 2 MiB.
pub const MAX_TEXT_BYTES: usize = 2 * 1024 * 1024;

/// Maximum number of live text entries held in memory at once.
pub const MAX_STORED_TEXTS: usize = 1000;

/// Maximum number of files in a single upload request.
pub const MAX_UPLOAD_FILES: usize = 20;

/// Maximum aggregate size of a single upload request: 200 MiB.
pub const MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;
