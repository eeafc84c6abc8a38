use std::collections::BTreeMap;
use std::io::{Read, Seek};

use imgstore_ledger::{InMemoryReferenceCounts, ReferenceCounts};
use imgstore_types::{Count, ImageId, ImageInfo};

use crate::config::DeletePolicy;
use crate::error::{StoreError, StoreResult};
use crate::traits::ImageManager;

#[derive(Clone, Debug, PartialEq, Eq)]
struct StoredBlob {
    extension: Option<&'static str>,
    data: Vec<u8>,
}

/// In-memory, `BTreeMap`-based image store.
///
/// Intended for tests and embedding. Locators use the `memory:` scheme and
/// are only meaningful to [`InMemoryImageManager::read_image`].
#[derive(Debug, Default)]
pub struct InMemoryImageManager {
    blobs: BTreeMap<ImageId, StoredBlob>,
    references: InMemoryReferenceCounts,
    delete_policy: DeletePolicy,
}

impl InMemoryImageManager {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delete_policy(mut self, policy: DeletePolicy) -> Self {
        self.delete_policy = policy;
        self
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Returns `true` if no blobs are stored.
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Total bytes across all stored blobs.
    pub fn total_bytes(&self) -> u64 {
        self.blobs.values().map(|b| b.data.len() as u64).sum()
    }

    /// Bytes of a stored blob.
    pub fn read_image(&self, id: &ImageId) -> StoreResult<&[u8]> {
        self.blobs
            .get(id)
            .map(|b| b.data.as_slice())
            .ok_or(StoreError::NotFound(*id))
    }
}

impl ImageManager for InMemoryImageManager {
    fn references(&self) -> &dyn ReferenceCounts {
        &self.references
    }

    fn references_mut(&mut self) -> &mut dyn ReferenceCounts {
        &mut self.references
    }

    fn add_image<R: Read + Seek + ?Sized>(
        &mut self,
        data: &mut R,
        info: &ImageInfo,
        count: Count,
    ) -> StoreResult<ImageId> {
        let mut bytes = Vec::new();
        data.read_to_end(&mut bytes)?;
        data.rewind()?;

        let id = ImageId::digest(&bytes);
        self.blobs.entry(id).or_insert_with(|| StoredBlob {
            extension: info.extension(),
            data: bytes,
        });
        self.references.increment(id, count)?;
        Ok(id)
    }

    fn get_image(&self, id: &ImageId) -> StoreResult<String> {
        let blob = self.blobs.get(id).ok_or(StoreError::NotFound(*id))?;
        Ok(match blob.extension {
            Some(ext) => format!("memory:{id}.{ext}"),
            None => format!("memory:{id}"),
        })
    }

    fn delete_image(&mut self, id: &ImageId) -> StoreResult<bool> {
        if self.blobs.remove(id).is_some() {
            if self.delete_policy == DeletePolicy::Reclaim && self.references.contains(id) {
                self.references.remove(id)?;
            }
            return Ok(true);
        }
        self.references.remove(id).map_err(StoreError::from_ledger)?;
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn add(store: &mut InMemoryImageManager, data: &[u8], count: Count) -> ImageId {
        store
            .add_image(&mut Cursor::new(data.to_vec()), &ImageInfo::new("image/png"), count)
            .unwrap()
    }

    #[test]
    fn add_and_read_back() {
        let mut store = InMemoryImageManager::new();
        let id = add(&mut store, b"pixels", Count::confirmed(1));
        assert_eq!(store.read_image(&id).unwrap(), b"pixels");
        assert_eq!(store.get_image(&id).unwrap(), format!("memory:{id}.png"));
    }

    #[test]
    fn identical_content_is_stored_once() {
        let mut store = InMemoryImageManager::new();
        let a = add(&mut store, b"same", Count::confirmed(1));
        let b = add(&mut store, b"same", Count::unconfirmed(2));
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
        assert_eq!(store.total_bytes(), 4);
        assert_eq!(store.references().get(&a), Some(Count::new(1, 2)));
    }

    #[test]
    fn default_prune_uses_trait_algorithm() {
        let mut store = InMemoryImageManager::new();
        let dead = add(&mut store, b"dead", Count::confirmed(1));
        let live = add(&mut store, b"live", Count::confirmed(1));
        store.references_mut().set(dead, Count::ZERO);

        assert_eq!(store.prune_images().unwrap(), 1);
        assert!(store.read_image(&live).is_ok());
        assert!(matches!(store.get_image(&dead), Err(StoreError::NotFound(_))));
        assert_eq!(store.references().get(&dead), Some(Count::ZERO));
    }

    #[test]
    fn reclaim_policy_clears_entries() {
        let mut store = InMemoryImageManager::new().with_delete_policy(DeletePolicy::Reclaim);
        let dead = add(&mut store, b"dead", Count::confirmed(1));
        store.references_mut().set(dead, Count::ZERO);

        assert_eq!(store.prune_images().unwrap(), 1);
        assert!(store.references().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn delete_without_blob_or_entry_is_not_found() {
        let mut store = InMemoryImageManager::new();
        let id = ImageId::digest(b"nope");
        assert!(matches!(store.delete_image(&id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn stale_zero_entry_fails_prune() {
        let mut store = InMemoryImageManager::new();
        let id = ImageId::digest(b"stale");
        store.references_mut().set(id, Count::ZERO);
        assert!(matches!(
            store.prune_images(),
            Err(StoreError::LedgerInconsistency { id: x }) if x == id
        ));
    }
}
