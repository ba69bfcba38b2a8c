//! Most-recently-served directories.

use serde::{Deserialize, Serialize};

/// Maximum number of directories remembered.
pub const RECENCY_CAPACITY: usize = 10;

/// Bounded, deduplicated list of served directories, most recent first.
///
/// Persisted as a plain JSON array. Lists read from disk go through the same
/// rules as [`RecencyList::record_access`], so duplicates are dropped and the
/// list is truncated to [`RECENCY_CAPACITY`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct RecencyList {
    entries: Vec<String>,
}

impl RecencyList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move `path` to the front, evicting the oldest entry past capacity.
    pub fn record_access(&mut self, path: &str) {
        let path = normalize(path);
        self.entries.retain(|existing| existing != path);
        self.entries.insert(0, path.to_string());
        self.entries.truncate(RECENCY_CAPACITY);
    }

    pub fn list(&self) -> &[String] {
        &self.entries
    }

    pub fn most_recent(&self) -> Option<&str> {
        self.entries.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<String>> for RecencyList {
    fn from(paths: Vec<String>) -> Self {
        let mut list = RecencyList::new();
        // Oldest first so the head of the stored array ends up at index 0.
        for path in paths.iter().rev() {
            list.record_access(path);
        }
        list
    }
}

impl From<RecencyList> for Vec<String> {
    fn from(list: RecencyList) -> Self {
        list.entries
    }
}

/// Trim trailing separators so `/srv/data/` and `/srv/data` are the same entry.
fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    if trimmed.is_empty() && !path.is_empty() {
        // Filesystem root: keep a single separator.
        &path[..1]
    } else {
        trimmed
    }
}
