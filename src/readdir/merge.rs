/*!
 * Listing Merge
 * First-branch-wins deduplication and synthetic inode assignment
 */

use ahash::RandomState;
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::Path;

use super::buffer::DirEntries;
use crate::core::errors::PoolResult;
use crate::core::types::DevId;
use crate::vfs::inode::InodeCalc;
use crate::vfs::types::{BranchEntry, DirEntry};

/// State of one merge pass
///
/// Lives for exactly one listing call. Branches must be fed in branch-set
/// order: the first branch to produce a name wins and later duplicates are
/// dropped.
pub(super) struct Merge<'a> {
    names: HashSet<OsString, RandomState>,
    dirname: &'a Path,
    inodecalc: InodeCalc,
    buf: &'a mut DirEntries,
}

impl<'a> Merge<'a> {
    pub(super) fn new(dirname: &'a Path, inodecalc: InodeCalc, buf: &'a mut DirEntries) -> Self {
        buf.reset();
        Self {
            names: HashSet::with_hasher(RandomState::new()),
            dirname,
            inodecalc,
            buf,
        }
    }

    /// Add every entry of one branch
    ///
    /// A read error ends this branch's contribution; only buffer exhaustion
    /// is returned.
    pub(super) fn add_branch<I>(&mut self, entries: I, dev: DevId) -> PoolResult<()>
    where
        I: IntoIterator<Item = PoolResult<BranchEntry>>,
    {
        for entry in entries {
            match entry {
                Ok(entry) => self.add(entry, dev)?,
                Err(e) => {
                    tracing::debug!(dir = %self.dirname.display(), error = %e, "branch listing cut short");
                    break;
                }
            }
        }
        Ok(())
    }

    fn add(&mut self, entry: BranchEntry, dev: DevId) -> PoolResult<()> {
        if self.names.contains(&entry.name) {
            return Ok(());
        }

        let fullpath = self.dirname.join(&entry.name);
        let ino = self.inodecalc.calc(&fullpath, entry.file_type, dev, entry.ino);
        self.buf.push(DirEntry {
            name: entry.name.clone(),
            ino,
            file_type: entry.file_type,
        })?;
        self.names.insert(entry.name);
        Ok(())
    }
}
