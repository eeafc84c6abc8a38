use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Default ledger filename, placed inside the blob root.
pub const DEFAULT_LEDGER_FILE: &str = "references.json";

/// What [`delete_image`](crate::ImageManager::delete_image) does to the
/// ledger when it removes a blob.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeletePolicy {
    /// Remove only the blob. Its ledger entry stays behind, so a pruned image
    /// keeps a zero entry until something clears it.
    #[default]
    FileOnly,
    /// Remove the blob and its ledger entry together.
    Reclaim,
}

/// Configuration for a [`LocalImageManager`](crate::LocalImageManager).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding the blobs.
    pub root: PathBuf,
    /// Ledger document. Defaults to `<root>/references.json`.
    pub ledger_path: Option<PathBuf>,
    /// Ledger handling on successful deletes.
    pub delete_policy: DeletePolicy,
    /// Write the ledger after every mutating store operation.
    pub auto_flush: bool,
    /// Create `root` if it does not exist.
    pub create_root: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("images"),
            ledger_path: None,
            delete_policy: DeletePolicy::default(),
            auto_flush: false,
            create_root: true,
        }
    }
}

impl StoreConfig {
    /// Default configuration rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Resolved ledger path.
    pub fn ledger_path(&self) -> PathBuf {
        self.ledger_path
            .clone()
            .unwrap_or_else(|| self.root.join(DEFAULT_LEDGER_FILE))
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        toml::from_str(s).map_err(|e| StoreError::Config(e.to_string()))
    }

    /// Load a TOML config file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = StoreConfig::default();
        assert_eq!(c.root, PathBuf::from("images"));
        assert_eq!(c.ledger_path(), PathBuf::from("images").join("references.json"));
        assert_eq!(c.delete_policy, DeletePolicy::FileOnly);
        assert!(!c.auto_flush);
        assert!(c.create_root);
    }

    #[test]
    fn explicit_ledger_path_wins() {
        let c = StoreConfig {
            ledger_path: Some("counts.json".into()),
            ..StoreConfig::new("/srv/img")
        };
        assert_eq!(c.ledger_path(), PathBuf::from("counts.json"));
    }

    #[test]
    fn parses_partial_toml() {
        let c = StoreConfig::from_toml_str(
            r#"
            root = "/var/lib/images"
            delete_policy = "reclaim"
            auto_flush = true
            "#,
        )
        .unwrap();
        assert_eq!(c.root, PathBuf::from("/var/lib/images"));
        assert_eq!(c.delete_policy, DeletePolicy::Reclaim);
        assert!(c.auto_flush);
        assert!(c.create_root);
        assert!(c.ledger_path.is_none());
    }

    #[test]
    fn rejects_unknown_policy() {
        let err = StoreConfig::from_toml_str(r#"delete_policy = "shred""#).unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(StoreConfig::from_toml_str("").unwrap(), StoreConfig::default());
    }
}
