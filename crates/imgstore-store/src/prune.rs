use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::traits::ImageManager;

/// Delete every image whose ledger count is exactly zero.
///
/// Candidates are collected up front and processed in ascending id order.
/// A candidate whose blob is already gone aborts the pass with
/// [`StoreError::LedgerInconsistency`]; blobs deleted before it stay deleted
/// and no partial count is reported.
pub fn prune_zero_counts<M: ImageManager + ?Sized>(manager: &mut M) -> StoreResult<usize> {
    let candidates = manager.references().zero_entries();
    debug!(candidates = candidates.len(), "prune started");

    let mut removed = 0;
    for id in candidates {
        if !manager.delete_image(&id)? {
            warn!(id = %id, removed, "zero-count image has no blob; aborting prune");
            return Err(StoreError::LedgerInconsistency { id });
        }
        removed += 1;
    }
    Ok(removed)
}
