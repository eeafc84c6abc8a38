use imgstore_types::ImageId;
use serde::{Deserialize, Serialize};

/// Divergence between the blob directory and the ledger.
///
/// The store tolerates temporary divergence; this report makes it visible.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    /// Blobs on disk with no ledger entry. Nothing will ever prune them.
    pub orphaned_blobs: Vec<ImageId>,
    /// Ledger entries with a nonzero count but no blob on disk.
    pub missing_blobs: Vec<ImageId>,
    /// Ledger entries at zero with no blob, typically left behind by a
    /// file-only delete. Pruning would fail on these.
    pub stale_entries: Vec<ImageId>,
}

impl ConsistencyReport {
    /// Returns `true` if nothing diverges.
    pub fn is_consistent(&self) -> bool {
        self.orphaned_blobs.is_empty()
            && self.missing_blobs.is_empty()
            && self.stale_entries.is_empty()
    }

    /// Total number of problems found.
    pub fn issue_count(&self) -> usize {
        self.orphaned_blobs.len() + self.missing_blobs.len() + self.stale_entries.len()
    }
}
