//! Content-addressed image storage for imgstore.
//!
//! Images are stored as flat files named by the SHA-256 of their bytes
//! (`<root>/<hex>[.<ext>]`). A reference-count ledger decides when a blob
//! may be reclaimed: once both its confirmed and unconfirmed counts are zero,
//! [`ImageManager::prune_images`] deletes it.
//!
//! # Backends
//!
//! All backends implement the [`ImageManager`] trait:
//!
//! - [`LocalImageManager`] -- blobs in a local directory, ledger in a JSON file
//! - [`InMemoryImageManager`] -- `BTreeMap`-based store for tests and embedding
//!
//! # Rules
//!
//! 1. Blobs are immutable once written. Adding identical bytes again only
//!    adjusts the reference count.
//! 2. The store owns the ledger. Callers adjust counts through the
//!    [`ReferenceCounts`] capability returned by
//!    [`ImageManager::references_mut`].
//! 3. The ledger is persisted only on [`LocalImageManager::flush`] unless
//!    `auto_flush` is configured.
//! 4. No internal locking. Callers coordinate concurrent access.
//! 5. All I/O errors are propagated, never retried.

pub mod config;
pub mod error;
pub mod local;
pub mod locator;
pub mod memory;
pub mod prune;
pub mod report;
pub mod traits;

pub use config::{DeletePolicy, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use imgstore_ledger::{InMemoryReferenceCounts, LocalReferenceCounts, ReferenceCounts};
pub use imgstore_types::{Count, ImageId, ImageInfo};
pub use local::LocalImageManager;
pub use locator::file_uri;
pub use memory::InMemoryImageManager;
pub use prune::prune_zero_counts;
pub use report::ConsistencyReport;
pub use traits::ImageManager;
