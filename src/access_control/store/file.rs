//! File-backed list store.
//!
//! All three lists live in one TOML document:
//!
//! ```toml
//! allowed_addresses = ["10.0.0.1", "192.168.1.10-20"]
//! whitelisted_paths = ["/node/1"]
//! blacklisted_paths = ["/admin/*"]
//! ```

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

use super::{ListDocument, ListKind, ListStore, StoreError, StoreResult};

/// File-backed list store.
///
/// The document is read on every load so edits made by other processes are
/// picked up without restarting. A missing file reads as empty lists.
#[derive(Debug)]
pub struct FileListStore {
    path: PathBuf,

    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileListStore {
    /// Create a store over `path`.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        debug!(path = %path.display(), "created file list store");
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// The backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole document.
    pub fn read_document(&self) -> StoreResult<ListDocument> {
        if !self.path.exists() {
            return Ok(ListDocument::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&content)?)
    }

    fn write_document(&self, document: &ListDocument) -> StoreResult<()> {
        let contents = toml::to_string_pretty(document)?;

        // Write to a sibling file, then rename over the original.
        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, contents)?;
        std::fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

impl ListStore for FileListStore {
    fn load(&self, kind: ListKind) -> StoreResult<Vec<String>> {
        let document = self.read_document()?;
        Ok(document.list(kind).clone())
    }

    fn save(&self, kind: ListKind, entries: &[String], overwrite: bool) -> StoreResult<()> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;

        let mut document = self.read_document()?;
        document.store(kind, entries, overwrite);
        self.write_document(&document)?;

        info!(
            path = %self.path.display(),
            list = %kind,
            entries = entries.len(),
            overwrite,
            "list saved"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
