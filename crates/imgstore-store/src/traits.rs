use std::io::{Read, Seek};

use imgstore_ledger::ReferenceCounts;
use imgstore_types::{Count, ImageId, ImageInfo};

use crate::error::StoreResult;
use crate::prune::prune_zero_counts;

/// Reference-counted, content-addressed image store.
///
/// All implementations must satisfy these invariants:
/// - Blobs are immutable once written. Byte-identical content always maps to
///   the same [`ImageId`] and is stored once.
/// - Every blob with a ledger entry is stored exactly once; the entry's count
///   is the sum of every count it was added or adjusted with.
/// - A blob is only deleted by [`delete_image`](Self::delete_image) or by
///   pruning a zero count.
pub trait ImageManager {
    /// Read-only view of the reference ledger.
    fn references(&self) -> &dyn ReferenceCounts;

    /// Mutable view of the reference ledger.
    ///
    /// This is how callers move references between tiers or drop them; the
    /// store only acts on the result when pruning.
    fn references_mut(&mut self) -> &mut dyn ReferenceCounts;

    /// Store `data` (if not already stored) and add `count` to its references.
    ///
    /// The stream is read to the end to hash it and is rewound to its start
    /// before returning, so the caller can read it again.
    fn add_image<R: Read + Seek + ?Sized>(
        &mut self,
        data: &mut R,
        info: &ImageInfo,
        count: Count,
    ) -> StoreResult<ImageId>;

    /// Resolve an image to a locator the caller can fetch it from.
    ///
    /// Returns [`StoreError::NotFound`](crate::StoreError::NotFound) if no
    /// blob is stored for `id`.
    fn get_image(&self, id: &ImageId) -> StoreResult<String>;

    /// Delete an image.
    ///
    /// Returns `Ok(true)` if a blob was removed. If no blob exists the ledger
    /// entry is dropped instead and `Ok(false)` is returned. Whether a
    /// successful delete also drops the ledger entry is up to the backend's
    /// [`DeletePolicy`](crate::DeletePolicy).
    fn delete_image(&mut self, id: &ImageId) -> StoreResult<bool>;

    /// Delete every image whose count is zero. Returns the number removed.
    ///
    /// Fails with
    /// [`StoreError::LedgerInconsistency`](crate::StoreError::LedgerInconsistency)
    /// if a zero-count entry has no blob; the pass stops there.
    fn prune_images(&mut self) -> StoreResult<usize> {
        prune_zero_counts(self)
    }
}
