/*!
 * Merged Listing Buffer
 * Caller-owned growable buffer the merger resets and appends to
 */

use crate::core::errors::{PoolError, PoolResult};
use crate::core::limits::DIRENTS_INITIAL_CAPACITY;
use crate::vfs::types::DirEntry;

/// Output buffer of a merged directory listing
///
/// Owned by the dispatch layer and reused across calls; the merger never
/// replaces it, only resets and appends. Growth failure is reported as
/// `OutOfMemory` instead of aborting the process.
#[derive(Debug, Default)]
pub struct DirEntries {
    entries: Vec<DirEntry>,
    max_entries: Option<usize>,
}

impl DirEntries {
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(DIRENTS_INITIAL_CAPACITY),
            max_entries: None,
        }
    }

    /// Buffer that refuses to grow past `max_entries`
    ///
    /// Mirrors a fixed-size kernel reply buffer.
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_entries: Some(max_entries),
        }
    }

    /// Drop all entries, keeping the allocation
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Append one entry
    pub fn push(&mut self, entry: DirEntry) -> PoolResult<()> {
        if let Some(max) = self.max_entries {
            if self.entries.len() >= max {
                return Err(PoolError::OutOfMemory(format!(
                    "listing buffer full at {} entries",
                    max
                )));
            }
        }
        self.entries
            .try_reserve(1)
            .map_err(|e| PoolError::OutOfMemory(e.to_string()))?;
        self.entries.push(entry);
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, DirEntry> {
        self.entries.iter()
    }

    #[inline]
    pub fn as_slice(&self) -> &[DirEntry] {
        &self.entries
    }

    /// Entry by name
    pub fn get(&self, name: &str) -> Option<&DirEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

impl<'a> IntoIterator for &'a DirEntries {
    type Item = &'a DirEntry;
    type IntoIter = std::slice::Iter<'a, DirEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
