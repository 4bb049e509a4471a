/*!
 * VFS Directory Entry
 * Entries as read from one branch and as emitted in a merged listing
 */

use super::file_type::FileType;
use crate::core::types::Ino;
use serde::{Serialize, Serializer};
use std::ffi::{OsStr, OsString};

/// Entry as enumerated from a single branch directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchEntry {
    pub name: OsString,
    /// Branch-local inode number
    pub ino: Ino,
    pub file_type: FileType,
}

impl BranchEntry {
    pub fn new(name: impl Into<OsString>, ino: Ino, file_type: FileType) -> Self {
        Self {
            name: name.into(),
            ino,
            file_type,
        }
    }
}

/// Entry of a merged directory listing
///
/// `ino` is the synthetic inode, stable for the logical path regardless of
/// which branch currently backs the entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntry {
    #[serde(serialize_with = "serialize_lossy")]
    pub name: OsString,
    pub ino: Ino,
    pub file_type: FileType,
}

impl DirEntry {
    #[inline]
    pub fn name(&self) -> &OsStr {
        &self.name
    }

    /// Check if this is a directory entry
    #[inline]
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        matches!(self.file_type, FileType::Directory)
    }
}

fn serialize_lossy<S: Serializer>(name: &OsString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&name.to_string_lossy())
}
