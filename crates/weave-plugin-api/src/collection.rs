//! Persistent, insertion-ordered plugin collection

use crate::plugin::PluginRecord;
use indexmap::IndexMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

fn next_version() -> u64 {
    NEXT_VERSION.fetch_add(1, Ordering::Relaxed)
}

/// Key-unique mapping from plugin key to record
///
/// The collection is persistent: `inserted` and `updated` return a new
/// collection and leave the receiver untouched. Every new collection is
/// stamped with a process-unique version, so two collections with the same
/// version are the same collection. The empty collection has version `0`.
///
/// Iteration follows the order in which keys first entered the collection.
/// Updating a record keeps its position.
#[derive(Clone, Default)]
pub struct PluginCollection {
    entries: Arc<IndexMap<String, PluginRecord>>,
    version: u64,
}

impl PluginCollection {
    /// Empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Record at `key`
    pub fn get(&self, key: &str) -> Option<&PluginRecord> {
        self.entries.get(key)
    }

    /// Whether a record exists at `key`
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the collection has no records
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &PluginRecord> {
        self.entries.values()
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Identity stamp of this collection
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Collection with `record` stored under its key
    ///
    /// A new key is appended; an existing key is overwritten in place.
    #[must_use]
    pub fn inserted(&self, record: PluginRecord) -> Self {
        let mut entries = IndexMap::clone(&self.entries);
        entries.insert(record.key().to_string(), record);
        Self {
            entries: Arc::new(entries),
            version: next_version(),
        }
    }

    /// Collection with the record at `key` rewritten by `update`
    ///
    /// Returns `None` when no record exists at `key`.
    #[must_use]
    pub fn updated<F>(&self, key: &str, update: F) -> Option<Self>
    where
        F: FnOnce(PluginRecord) -> PluginRecord,
    {
        let current = self.entries.get(key)?.clone();
        let mut entries = IndexMap::clone(&self.entries);
        if let Some(slot) = entries.get_mut(key) {
            *slot = update(current);
        }
        Some(Self {
            entries: Arc::new(entries),
            version: next_version(),
        })
    }
}

impl FromIterator<PluginRecord> for PluginCollection {
    fn from_iter<I: IntoIterator<Item = PluginRecord>>(iter: I) -> Self {
        let entries: IndexMap<String, PluginRecord> = iter
            .into_iter()
            .map(|record| (record.key().to_string(), record))
            .collect();
        if entries.is_empty() {
            return Self::default();
        }
        Self {
            entries: Arc::new(entries),
            version: next_version(),
        }
    }
}

impl PartialEq for PluginCollection {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version || self.entries == other.entries
    }
}

impl fmt::Debug for PluginCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginCollection")
            .field("version", &self.version)
            .field("plugins", &self.entries.values().collect::<Vec<_>>())
            .finish()
    }
}
