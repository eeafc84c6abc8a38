use std::fs;
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};

use imgstore_ledger::{LocalReferenceCounts, ReferenceCounts};
use imgstore_types::{Count, ImageId, ImageInfo};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::{DeletePolicy, StoreConfig};
use crate::error::{StoreError, StoreResult};
use crate::locator::file_uri;
use crate::prune::prune_zero_counts;
use crate::report::ConsistencyReport;
use crate::traits::ImageManager;

/// Image store backed by a flat local directory.
///
/// Blobs live at `<root>/<hex-sha256>[.<ext>]`, the extension derived from
/// the MIME type declared on first write. The manager owns its ledger `R`;
/// [`LocalReferenceCounts`] persists it as JSON.
#[derive(Debug)]
pub struct LocalImageManager<R: ReferenceCounts = LocalReferenceCounts> {
    root: PathBuf,
    references: R,
    delete_policy: DeletePolicy,
    auto_flush: bool,
}

impl LocalImageManager<LocalReferenceCounts> {
    /// Open a store from configuration, loading (or creating) its ledger.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        if config.create_root {
            fs::create_dir_all(&config.root)?;
        } else if !config.root.is_dir() {
            return Err(StoreError::Config(format!(
                "image root {} is not a directory",
                config.root.display()
            )));
        }

        let ledger_path = config.ledger_path();
        let references = LocalReferenceCounts::open(&ledger_path, None)?;
        info!(
            root = %config.root.display(),
            ledger = %ledger_path.display(),
            entries = references.len(),
            "image store opened"
        );

        Ok(Self::new(&config.root, references)
            .with_delete_policy(config.delete_policy)
            .with_auto_flush(config.auto_flush))
    }
}

impl<R: ReferenceCounts> LocalImageManager<R> {
    /// Create a manager over an existing directory and ledger.
    pub fn new(root: impl Into<PathBuf>, references: R) -> Self {
        Self {
            root: root.into(),
            references,
            delete_policy: DeletePolicy::default(),
            auto_flush: false,
        }
    }

    pub fn with_delete_policy(mut self, policy: DeletePolicy) -> Self {
        self.delete_policy = policy;
        self
    }

    pub fn with_auto_flush(mut self, auto_flush: bool) -> Self {
        self.auto_flush = auto_flush;
        self
    }

    /// Persist the ledger.
    pub fn flush(&self) -> StoreResult<()> {
        self.references.flush()?;
        Ok(())
    }

    /// Absolute path of the stored blob for `id`.
    pub fn image_path(&self, id: &ImageId) -> StoreResult<PathBuf> {
        let path = self.find_blob(id)?.ok_or(StoreError::NotFound(*id))?;
        Ok(std::path::absolute(path)?)
    }

    /// IDs of every blob in the root, ascending. Files whose stem is not an
    /// image ID (the ledger document, stray files) are skipped.
    pub fn list_images(&self) -> StoreResult<Vec<ImageId>> {
        let mut ids: Vec<ImageId> = self
            .blob_files(|name| blob_stem(name).is_some())?
            .iter()
            .filter_map(|path| path.file_name()?.to_str().and_then(blob_stem))
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    /// Compare the blob directory against the ledger.
    pub fn check(&self) -> StoreResult<ConsistencyReport> {
        let stored = self.list_images()?;
        let mut report = ConsistencyReport::default();

        for id in &stored {
            if !self.references.contains(id) {
                report.orphaned_blobs.push(*id);
            }
        }
        for (id, count) in self.references.entries() {
            if stored.binary_search(&id).is_ok() {
                continue;
            }
            if count.is_zero() {
                report.stale_entries.push(id);
            } else {
                report.missing_blobs.push(id);
            }
        }
        Ok(report)
    }

    fn candidate_path(&self, id: &ImageId, info: &ImageInfo) -> PathBuf {
        match info.extension() {
            Some(ext) => self.root.join(format!("{id}.{ext}")),
            None => self.root.join(id.to_hex()),
        }
    }

    /// Regular files directly under the root whose name passes `wanted`,
    /// sorted by name. Symlinks are resolved only for wanted names, so a
    /// broken link or loop elsewhere in the root does not affect lookups.
    fn blob_files(&self, wanted: impl Fn(&str) -> bool) -> StoreResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();
        for entry in walker {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_name().to_str().is_some_and(&wanted) {
                continue;
            }
            let is_file = if entry.path_is_symlink() {
                match fs::metadata(entry.path()) {
                    Ok(meta) => meta.is_file(),
                    Err(e) => {
                        warn!(path = %entry.path().display(), error = %e, "skipping unresolvable link");
                        false
                    }
                }
            } else {
                entry.file_type().is_file()
            };
            if is_file {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    /// First blob (by filename) whose stem is `id`.
    fn find_blob(&self, id: &ImageId) -> StoreResult<Option<PathBuf>> {
        let stem = id.to_hex();
        let found = self.blob_files(|name| {
            name == stem
                || name
                    .strip_prefix(stem.as_str())
                    .is_some_and(|rest| rest.starts_with('.'))
        })?;
        Ok(found.into_iter().next())
    }

    fn write_blob<D: Read + ?Sized>(&self, data: &mut D, dest: &Path) -> StoreResult<u64> {
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        let written = io::copy(data, &mut tmp)?;
        tmp.as_file().sync_all()?;
        tmp.persist(dest).map_err(|e| StoreError::Io(e.error))?;
        Ok(written)
    }

    fn maybe_flush(&self) -> StoreResult<()> {
        if self.auto_flush {
            self.flush()?;
        }
        Ok(())
    }
}

/// The image ID a blob filename is stored under, if any.
fn blob_stem(name: &str) -> Option<ImageId> {
    let stem = name.split_once('.').map_or(name, |(stem, _)| stem);
    ImageId::from_hex(stem).ok()
}

impl<R: ReferenceCounts> ImageManager for LocalImageManager<R> {
    fn references(&self) -> &dyn ReferenceCounts {
        &self.references
    }

    fn references_mut(&mut self) -> &mut dyn ReferenceCounts {
        &mut self.references
    }

    fn add_image<D: Read + Seek + ?Sized>(
        &mut self,
        data: &mut D,
        info: &ImageInfo,
        count: Count,
    ) -> StoreResult<ImageId> {
        let id = ImageId::digest_reader(data)?;
        data.rewind()?;

        let path = self.candidate_path(&id, info);
        match fs::metadata(&path) {
            Ok(meta) if !meta.is_file() => return Err(StoreError::ConflictingPath(path)),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let stored = self.find_blob(&id)?.is_some();
        if !stored {
            let bytes = self.write_blob(data, &path)?;
            data.rewind()?;
            debug!(id = %id.short_hex(), bytes, path = %path.display(), "blob written");

            if let Some(previous) = self.references.get(&id).filter(|c| !c.is_zero()) {
                warn!(id = %id, count = %previous, "restored missing blob for referenced image");
            }
        } else if !self.references.contains(&id) {
            warn!(id = %id, "adopting blob with no ledger entry");
        }

        let updated = self.references.increment(id, count)?;
        debug!(id = %id.short_hex(), deduplicated = stored, count = %updated, "image added");
        self.maybe_flush()?;
        Ok(id)
    }

    fn get_image(&self, id: &ImageId) -> StoreResult<String> {
        file_uri(&self.image_path(id)?)
    }

    fn delete_image(&mut self, id: &ImageId) -> StoreResult<bool> {
        let deleted = match self.find_blob(id)? {
            Some(path) => {
                fs::remove_file(&path)?;
                if self.delete_policy == DeletePolicy::Reclaim && self.references.contains(id) {
                    self.references.remove(id)?;
                }
                debug!(id = %id.short_hex(), path = %path.display(), "blob deleted");
                true
            }
            None => {
                self.references.remove(id).map_err(StoreError::from_ledger)?;
                debug!(id = %id.short_hex(), "no blob; dropped ledger entry");
                false
            }
        };
        self.maybe_flush()?;
        Ok(deleted)
    }

    fn prune_images(&mut self) -> StoreResult<usize> {
        let removed = prune_zero_counts(self)?;
        info!(removed, "prune complete");
        Ok(removed)
    }
}
