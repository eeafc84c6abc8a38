//! JSON-file-backed ledger.
//!
//! The whole ledger lives in a single JSON object keyed by image ID:
//!
//! ```text
//! {"2cf24dba...": {"confirmed": 1, "unconfirmed": 0}, ...}
//! ```
//!
//! It is loaded eagerly, mutated in memory, and written back only on
//! [`LocalReferenceCounts::write`] (or [`ReferenceCounts::flush`]).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use imgstore_types::{Count, ImageId};
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{LedgerError, Result};
use crate::traits::ReferenceCounts;

/// A [`ReferenceCounts`] backed by a JSON document on disk.
#[derive(Debug)]
pub struct LocalReferenceCounts {
    path: PathBuf,
    counts: BTreeMap<ImageId, Count>,
}

impl LocalReferenceCounts {
    /// Open the ledger at `path`.
    ///
    /// - No document at `path`: start from `seed` (or empty) and write it out
    ///   immediately.
    /// - Document present, no seed: load it with [`read`](Self::read).
    /// - Document present and a seed given: the seed wins and the document is
    ///   not read. It will be overwritten by the next [`write`](Self::write).
    ///
    /// An empty seed is treated the same as no seed.
    pub fn open(
        path: impl Into<PathBuf>,
        seed: Option<BTreeMap<ImageId, Count>>,
    ) -> Result<Self> {
        let mut ledger = Self {
            path: path.into(),
            counts: BTreeMap::new(),
        };
        let seed = seed.filter(|s| !s.is_empty());

        if !ledger.path.exists() {
            ledger.counts = seed.unwrap_or_default();
            ledger.write()?;
        } else if let Some(seed) = seed {
            debug!(path = %ledger.path.display(), "existing ledger shadowed by seed");
            ledger.counts = seed;
        } else {
            ledger.read()?;
        }
        Ok(ledger)
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the in-memory state with the document on disk.
    ///
    /// Loading is all-or-nothing: if any entry is malformed the in-memory
    /// state is left untouched and [`LedgerError::MalformedLedger`] is
    /// returned.
    pub fn read(&mut self) -> Result<()> {
        let raw = fs::read_to_string(&self.path)?;
        self.counts = parse_document(&raw)?;
        debug!(path = %self.path.display(), entries = self.counts.len(), "ledger loaded");
        Ok(())
    }

    /// Write the complete in-memory ledger to disk, replacing the document.
    ///
    /// The document is written to a temporary file beside the target and
    /// renamed over it, so readers never observe a partial document.
    pub fn write(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer(&mut tmp, &self.counts)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| LedgerError::Io(e.error))?;
        debug!(path = %self.path.display(), entries = self.counts.len(), "ledger written");
        Ok(())
    }
}

/// Validate and decode a ledger document.
fn parse_document(raw: &str) -> Result<BTreeMap<ImageId, Count>> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| LedgerError::MalformedLedger(e.to_string()))?;
    let Value::Object(entries) = value else {
        return Err(LedgerError::MalformedLedger(
            "document is not a JSON object".into(),
        ));
    };

    let mut counts = BTreeMap::new();
    for (key, entry) in entries {
        let id = ImageId::from_hex(&key)
            .map_err(|e| LedgerError::MalformedLedger(format!("bad image id {key:?}: {e}")))?;
        let count: Count = serde_json::from_value(entry)
            .map_err(|e| LedgerError::MalformedLedger(format!("bad entry for {key}: {e}")))?;
        counts.insert(id, count);
    }
    Ok(counts)
}

impl ReferenceCounts for LocalReferenceCounts {
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

    fn flush(&self) -> Result<()> {
        self.write()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    const HELLO: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    fn ledger_path(dir: &TempDir) -> PathBuf {
        dir.path().join("references.json")
    }

    fn hello_id() -> ImageId {
        ImageId::from_hex(HELLO).unwrap()
    }

    #[test]
    fn open_missing_document_writes_empty_object() {
        let dir = TempDir::new().unwrap();
        let ledger = LocalReferenceCounts::open(ledger_path(&dir), None).unwrap();
        assert!(ledger.is_empty());
        assert_eq!(fs::read_to_string(ledger_path(&dir)).unwrap(), "{}");
    }

    #[test]
    fn open_missing_document_persists_seed() {
        let dir = TempDir::new().unwrap();
        let seed = BTreeMap::from([(hello_id(), Count::new(2, 1))]);
        LocalReferenceCounts::open(ledger_path(&dir), Some(seed)).unwrap();

        let reopened = LocalReferenceCounts::open(ledger_path(&dir), None).unwrap();
        assert_eq!(reopened.get(&hello_id()), Some(Count::new(2, 1)));
    }

    #[test]
    fn open_existing_document_loads_it() {
        let dir = TempDir::new().unwrap();
        fs::write(
            ledger_path(&dir),
            format!(r#"{{"{HELLO}": {{"confirmed": 4, "unconfirmed": 5}}}}"#),
        )
        .unwrap();
        let ledger = LocalReferenceCounts::open(ledger_path(&dir), None).unwrap();
        assert_eq!(ledger.get(&hello_id()), Some(Count::new(4, 5)));
    }

    #[test]
    fn seed_shadows_existing_document_until_written() {
        let dir = TempDir::new().unwrap();
        let on_disk = format!(r#"{{"{HELLO}": {{"confirmed": 4, "unconfirmed": 5}}}}"#);
        fs::write(ledger_path(&dir), &on_disk).unwrap();

        let other = ImageId::digest(b"other");
        let seed = BTreeMap::from([(other, Count::confirmed(1))]);
        let mut ledger = LocalReferenceCounts::open(ledger_path(&dir), Some(seed)).unwrap();

        assert_eq!(ledger.ids(), vec![other]);
        assert_eq!(fs::read_to_string(ledger_path(&dir)).unwrap(), on_disk);

        ledger.read().unwrap();
        assert_eq!(ledger.ids(), vec![hello_id()]);
    }

    #[test]
    fn empty_seed_counts_as_no_seed() {
        let dir = TempDir::new().unwrap();
        fs::write(
            ledger_path(&dir),
            format!(r#"{{"{HELLO}": {{"confirmed": 1, "unconfirmed": 0}}}}"#),
        )
        .unwrap();
        let ledger = LocalReferenceCounts::open(ledger_path(&dir), Some(BTreeMap::new())).unwrap();
        assert_eq!(ledger.get(&hello_id()), Some(Count::confirmed(1)));
    }

    #[test]
    fn write_then_read_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut ledger = LocalReferenceCounts::open(ledger_path(&dir), None).unwrap();
        ledger.set(hello_id(), Count::new(1, 1));
        ledger.set(ImageId::digest(b"x"), Count::ZERO);
        ledger.write().unwrap();

        let mut reopened = LocalReferenceCounts::open(ledger_path(&dir), None).unwrap();
        reopened.read().unwrap();
        assert_eq!(reopened.entries(), ledger.entries());
    }

    #[test]
    fn writes_expected_json_shape() {
        let dir = TempDir::new().unwrap();
        let mut ledger = LocalReferenceCounts::open(ledger_path(&dir), None).unwrap();
        ledger.set(hello_id(), Count::new(1, 0));
        ledger.flush().unwrap();

        let raw = fs::read_to_string(ledger_path(&dir)).unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[HELLO]["confirmed"], 1);
        assert_eq!(value[HELLO]["unconfirmed"], 0);
    }

    #[test]
    fn emptied_ledger_writes_empty_object() {
        let dir = TempDir::new().unwrap();
        let mut ledger = LocalReferenceCounts::open(ledger_path(&dir), None).unwrap();
        ledger.set(hello_id(), Count::new(1, 0));
        ledger.write().unwrap();
        ledger.remove(&hello_id()).unwrap();
        ledger.write().unwrap();
        assert_eq!(fs::read_to_string(ledger_path(&dir)).unwrap(), "{}");
    }

    fn assert_malformed(document: &str) {
        let dir = TempDir::new().unwrap();
        fs::write(ledger_path(&dir), document).unwrap();
        let err = LocalReferenceCounts::open(ledger_path(&dir), None).unwrap_err();
        assert!(
            matches!(err, LedgerError::MalformedLedger(_)),
            "expected MalformedLedger for {document}, got {err:?}"
        );
    }

    #[test]
    fn rejects_non_object_document() {
        assert_malformed("[]");
        assert_malformed("42");
        assert_malformed("not json");
    }

    #[test]
    fn rejects_missing_fields() {
        assert_malformed(&format!(r#"{{"{HELLO}": {{"confirmed": 1}}}}"#));
        assert_malformed(&format!(r#"{{"{HELLO}": {{"unconfirmed": 1}}}}"#));
        assert_malformed(&format!(r#"{{"{HELLO}": 3}}"#));
    }

    #[test]
    fn rejects_non_integer_fields() {
        assert_malformed(&format!(
            r#"{{"{HELLO}": {{"confirmed": "1", "unconfirmed": 0}}}}"#
        ));
        assert_malformed(&format!(
            r#"{{"{HELLO}": {{"confirmed": 1.5, "unconfirmed": 0}}}}"#
        ));
        assert_malformed(&format!(
            r#"{{"{HELLO}": {{"confirmed": -1, "unconfirmed": 0}}}}"#
        ));
    }

    #[test]
    fn rejects_bad_image_id_key() {
        assert_malformed(r#"{"not-a-hash": {"confirmed": 1, "unconfirmed": 0}}"#);
    }

    #[test]
    fn one_bad_entry_invalidates_whole_load() {
        let dir = TempDir::new().unwrap();
        let mut ledger = LocalReferenceCounts::open(ledger_path(&dir), None).unwrap();
        ledger.set(ImageId::digest(b"kept"), Count::confirmed(7));

        let good = ImageId::digest(b"good");
        fs::write(
            ledger_path(&dir),
            format!(
                r#"{{"{good}": {{"confirmed": 1, "unconfirmed": 0}}, "{HELLO}": {{"confirmed": 1}}}}"#
            ),
        )
        .unwrap();

        assert!(matches!(ledger.read(), Err(LedgerError::MalformedLedger(_))));
        assert_eq!(ledger.ids(), vec![ImageId::digest(b"kept")]);
    }

    #[test]
    fn extra_entry_fields_are_ignored() {
        let dir = TempDir::new().unwrap();
        fs::write(
            ledger_path(&dir),
            format!(r#"{{"{HELLO}": {{"confirmed": 1, "unconfirmed": 2, "note": "x"}}}}"#),
        )
        .unwrap();
        let ledger = LocalReferenceCounts::open(ledger_path(&dir), None).unwrap();
        assert_eq!(ledger.get(&hello_id()), Some(Count::new(1, 2)));
    }

    proptest! {
        #[test]
        fn persisted_counts_survive_reload(
            entries in proptest::collection::btree_map(
                any::<[u8; 32]>().prop_map(ImageId::from_hash),
                (any::<u64>(), any::<u64>()).prop_map(|(c, u)| Count::new(c, u)),
                0..16,
            )
        ) {
            let dir = TempDir::new().unwrap();
            let mut ledger = LocalReferenceCounts::open(ledger_path(&dir), None).unwrap();
            for (id, count) in &entries {
                ledger.set(*id, *count);
            }
            ledger.write().unwrap();

            let reopened = LocalReferenceCounts::open(ledger_path(&dir), None).unwrap();
            prop_assert_eq!(reopened.counts, entries);
        }
    }
}
