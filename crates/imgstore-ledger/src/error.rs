//! Error types for ledger operations.

use imgstore_types::{Count, ImageId};
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The persisted ledger document failed structural validation.
    #[error("malformed ledger: {0}")]
    MalformedLedger(String),

    /// No entry exists for this image.
    #[error("no ledger entry for image {0}")]
    NotFound(ImageId),

    /// A decrement would take a tier below zero.
    #[error("count underflow for image {id}: {current} - {by}")]
    Underflow {
        id: ImageId,
        current: Count,
        by: Count,
    },

    /// An increment would take a tier past `u64::MAX`.
    #[error("count overflow for image {id}: {current} + {by}")]
    Overflow {
        id: ImageId,
        current: Count,
        by: Count,
    },

    /// Serialization failure while writing the ledger.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error while reading or writing the ledger document.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
