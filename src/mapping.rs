//! Shared local-path → original-URL mapping table.
//!
//! Populated on every successful playlist rewrite and read by the resource
//! handler. Entries are merged, never removed; later merges with the same
//! local path overwrite earlier ones (last-writer-wins). Unbounded growth
//! over the process lifetime is an accepted deployment constraint.

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Thread-safe mapping table shared by all request handlers.
#[derive(Clone, Debug, Default)]
pub struct MappingTable {
    entries: Arc<DashMap<String, String>>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }

    /// Merge a rewrite delta into the table, overwriting existing entries.
    pub fn merge(&self, delta: HashMap<String, String>) {
        for (local_path, original_url) in delta {
            debug!("Mapping {} -> {}", local_path, original_url);
            self.entries.insert(local_path, original_url);
        }
    }

    /// Resolve a local path back to its original URL.
    pub fn lookup(&self, local_path: &str) -> Option<String> {
        self.entries.get(local_path).map(|entry| entry.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
