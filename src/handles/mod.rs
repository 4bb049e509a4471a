/*!
 * File Handles
 * Opaque ids handed to the kernel, validated against a concurrent table
 */

use ahash::RandomState;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::core::errors::{PoolError, PoolResult};
use crate::core::limits::FIRST_HANDLE_ID;

/// Handle id as stored in the kernel's per-open state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct FileHandle(pub u64);

impl FileHandle {
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for FileHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fh:{}", self.0)
    }
}

/// What a handle refers to
#[derive(Debug)]
pub enum HandleKind {
    /// Open file on one branch
    File(File),
    /// Open logical directory; listing happens at readdir time
    Dir,
}

/// State behind a handle
#[derive(Debug)]
pub struct HandleInfo {
    pub fusepath: PathBuf,
    pub kind: HandleKind,
}

impl HandleInfo {
    pub fn file(fusepath: &Path, file: File) -> Self {
        Self {
            fusepath: fusepath.to_path_buf(),
            kind: HandleKind::File(file),
        }
    }

    pub fn dir(fusepath: &Path) -> Self {
        Self {
            fusepath: fusepath.to_path_buf(),
            kind: HandleKind::Dir,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, HandleKind::Dir)
    }

    /// The open file; directory handles have none
    pub fn as_file(&self) -> PoolResult<&File> {
        match &self.kind {
            HandleKind::File(file) => Ok(file),
            HandleKind::Dir => Err(PoolError::InvalidArgument(format!(
                "{} is a directory handle",
                self.fusepath.display()
            ))),
        }
    }
}

/// Table of live handles
///
/// Ids are never reused within one table. Entries are shared out as `Arc`
/// so a concurrent `release` cannot pull state out from under a reader.
pub struct FileHandles {
    next_id: AtomicU64,
    table: DashMap<u64, Arc<HandleInfo>, RandomState>,
}

impl FileHandles {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(FIRST_HANDLE_ID),
            table: DashMap::with_hasher(RandomState::new()),
        }
    }

    pub fn insert(&self, info: HandleInfo) -> FileHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.table.insert(id, Arc::new(info));
        FileHandle(id)
    }

    pub fn get(&self, fh: FileHandle) -> PoolResult<Arc<HandleInfo>> {
        self.table
            .get(&fh.0)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(PoolError::BadHandle(fh.0))
    }

    /// Remove a handle; the file closes once the last reader drops it
    pub fn remove(&self, fh: FileHandle) -> PoolResult<Arc<HandleInfo>> {
        self.table
            .remove(&fh.0)
            .map(|(_, info)| info)
            .ok_or(PoolError::BadHandle(fh.0))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for FileHandles {
    fn default() -> Self {
        Self::new()
    }
}
