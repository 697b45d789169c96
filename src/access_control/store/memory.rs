//! In-memory list store.

use std::sync::RwLock;

use super::{ListDocument, ListKind, ListStore, StoreError, StoreResult};

/// In-memory list store.
#[derive(Debug, Default)]
pub struct MemoryListStore {
    lists: RwLock<ListDocument>,
}

impl MemoryListStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `lists`.
    #[must_use]
    pub fn from_document(lists: ListDocument) -> Self {
        Self {
            lists: RwLock::new(lists),
        }
    }

    /// Seed the allowlist.
    #[must_use]
    pub fn with_allowed_addresses<I, S>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.seeded(ListKind::AllowedAddresses, entries)
    }

    /// Seed the path whitelist.
    #[must_use]
    pub fn with_whitelisted_paths<I, S>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.seeded(ListKind::WhitelistedPaths, entries)
    }

    /// Seed the path blacklist.
    #[must_use]
    pub fn with_blacklisted_paths<I, S>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.seeded(ListKind::BlacklistedPaths, entries)
    }

    /// Copy of every list.
    pub fn snapshot(&self) -> StoreResult<ListDocument> {
        Ok(self.lists.read().map_err(|_| StoreError::Poisoned)?.clone())
    }

    fn seeded<I, S>(mut self, kind: ListKind, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries: Vec<String> = entries.into_iter().map(Into::into).collect();
        // Builder runs before the store is shared, so the lock cannot be poisoned.
        if let Ok(lists) = self.lists.get_mut() {
            lists.store(kind, &entries, true);
        }
        self
    }
}

impl ListStore for MemoryListStore {
    fn load(&self, kind: ListKind) -> StoreResult<Vec<String>> {
        let lists = self.lists.read().map_err(|_| StoreError::Poisoned)?;
        Ok(lists.list(kind).clone())
    }

    fn save(&self, kind: ListKind, entries: &[String], overwrite: bool) -> StoreResult<()> {
        let mut lists = self.lists.write().map_err(|_| StoreError::Poisoned)?;
        lists.store(kind, entries, overwrite);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
