//! Reference-count ledger for imgstore.
//!
//! The ledger maps every stored [`ImageId`](imgstore_types::ImageId) to a
//! two-tier [`Count`](imgstore_types::Count). It is kept apart from the blob
//! directory so that adjusting a count never touches the blob itself, and so
//! that the persistence format is independent of the storage layout.
//!
//! # Modules
//!
//! - [`error`] — Error types for ledger operations
//! - [`traits`] — The [`ReferenceCounts`] capability interface
//! - [`memory`] — In-memory [`InMemoryReferenceCounts`] for tests and embedding
//! - [`local`] — JSON-file-backed [`LocalReferenceCounts`]

pub mod error;
pub mod local;
pub mod memory;
pub mod traits;

pub use error::{LedgerError, Result};
pub use local::LocalReferenceCounts;
pub use memory::InMemoryReferenceCounts;
pub use traits::ReferenceCounts;
