//! In-memory ledger for testing and ephemeral use.

use std::collections::BTreeMap;

use imgstore_types::{Count, ImageId};

use crate::error::{LedgerError, Result};
use crate::traits::ReferenceCounts;

/// An in-memory implementation of [`ReferenceCounts`].
///
/// Data is lost when the ledger is dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InMemoryReferenceCounts {
    counts: BTreeMap<ImageId, Count>,
}

impl InMemoryReferenceCounts {
    /// Create a new empty ledger.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReferenceCounts for InMemoryReferenceCounts {
    fn get(&self, id: &ImageId) -> Option<Count> {
        self.counts.get(id).copied()
    }

    fn set(&mut self, id: ImageId, count: Count) {
        self.counts.insert(id, count);
    }

    fn remove(&mut self, id: &ImageId) -> Result<Count> {
        self.counts.remove(id).ok_or(LedgerError::NotFound(*id))
    }

    fn ids(&self) -> Vec<ImageId> {
        self.counts.keys().copied().collect()
    }

    fn len(&self) -> usize {
        self.counts.len()
    }
}
