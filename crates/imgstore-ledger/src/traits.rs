//! The [`ReferenceCounts`] trait defining the ledger capability interface.
//!
//! The image store owns the canonical ledger. Callers that adjust counts
//! (publishing a draft, dropping a reference) do so through this narrow
//! interface rather than the backend's internal representation.

use imgstore_types::{Count, ImageId};

use crate::error::{LedgerError, Result};

/// Mapping from image identity to its reference count.
///
/// Implementations hold the full ledger in memory. Durable backends persist
/// it on [`flush`](ReferenceCounts::flush); mutations are not written through.
pub trait ReferenceCounts: Send {
    /// Current count for `id`, or `None` if the ledger has no entry.
    fn get(&self, id: &ImageId) -> Option<Count>;

    /// Replace the whole count for `id`, creating the entry if needed.
    fn set(&mut self, id: ImageId, count: Count);

    /// Remove the entry for `id`, returning its last count.
    ///
    /// Fails with [`LedgerError::NotFound`] if there is no entry.
    fn remove(&mut self, id: &ImageId) -> Result<Count>;

    /// All image IDs with an entry, in ascending order.
    fn ids(&self) -> Vec<ImageId>;

    /// Number of entries.
    fn len(&self) -> usize;

    /// Persist the ledger if the backend is durable.
    fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Returns `true` if the ledger has an entry for `id`.
    fn contains(&self, id: &ImageId) -> bool {
        self.get(id).is_some()
    }

    /// Returns `true` if the ledger has no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add `by` to the entry for `id`, starting from zero if absent.
    ///
    /// Fails with [`LedgerError::Overflow`] if either tier would exceed
    /// `u64::MAX`; the entry is left unchanged.
    fn increment(&mut self, id: ImageId, by: Count) -> Result<Count> {
        let current = self.get(&id).unwrap_or_default();
        let updated = current
            .checked_add(by)
            .ok_or(LedgerError::Overflow { id, current, by })?;
        self.set(id, updated);
        Ok(updated)
    }

    /// Subtract `by` from the entry for `id`.
    ///
    /// The entry is kept even when it reaches zero; pruning reclaims it.
    fn decrement(&mut self, id: &ImageId, by: Count) -> Result<Count> {
        let current = self.get(id).ok_or(LedgerError::NotFound(*id))?;
        let updated = current.checked_sub(by).ok_or(LedgerError::Underflow {
            id: *id,
            current,
            by,
        })?;
        self.set(*id, updated);
        Ok(updated)
    }

    /// All entries, in ascending id order.
    fn entries(&self) -> Vec<(ImageId, Count)> {
        self.ids()
            .into_iter()
            .filter_map(|id| self.get(&id).map(|count| (id, count)))
            .collect()
    }

    /// IDs whose count is exactly zero in both tiers.
    fn zero_entries(&self) -> Vec<ImageId> {
        self.entries()
            .into_iter()
            .filter(|(_, count)| count.is_zero())
            .map(|(id, _)| id)
            .collect()
    }
}
