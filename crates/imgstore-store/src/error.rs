use std::path::PathBuf;

use imgstore_ledger::LedgerError;
use imgstore_types::ImageId;

/// Errors from image store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Something other than a regular file occupies the blob's path.
    #[error("{0} already exists but is not a regular file")]
    ConflictingPath(PathBuf),

    /// No blob (or, on deletion, no ledger entry) exists for this image.
    #[error("image not found: {0}")]
    NotFound(ImageId),

    /// A zero-count ledger entry has no backing file. The count can only
    /// reach zero while the file still exists, so the store is inconsistent.
    #[error("ledger inconsistency: zero-count image {id} has no file")]
    LedgerInconsistency { id: ImageId },

    /// A blob path that cannot be expressed as a `file://` URI.
    #[error("cannot build a file URI for {0}")]
    InvalidLocator(PathBuf),

    /// Ledger failure (malformed document, persistence error).
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Invalid store configuration.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error from the blob directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Lift a ledger error, surfacing a missing entry as [`StoreError::NotFound`].
    pub(crate) fn from_ledger(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(id) => Self::NotFound(id),
            other => Self::Ledger(other),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
