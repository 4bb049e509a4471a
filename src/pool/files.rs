/*!
 * File Operations
 * getattr, open, create and I/O on open handles
 */

use std::os::unix::fs::FileExt;
use std::path::Path;

use super::PoolFs;
use crate::config::Func;
use crate::core::errors::{PoolError, PoolResult};
use crate::core::types::Caller;
use crate::handles::{FileHandle, HandleInfo};
use crate::vfs::clonepath::clone_path_as_root;
use crate::vfs::types::Attr;

impl PoolFs {
    /// Attributes of the copy the search policy finds first
    ///
    /// The inode is replaced by the synthetic one, the same value a merged
    /// listing reports for this path.
    pub fn getattr(&self, caller: Caller, path: &Path) -> PoolResult<Attr> {
        self.run("getattr", path, caller, |op| {
            let targets = op.snap.select(self.backend.as_ref(), Func::Getattr, op.path)?;
            let target = targets.first();
            op.span.record_branch(target.root());

            let mut attr = self.backend.lstat(&target.full_path)?;
            attr.ino = op
                .snap
                .config
                .inodecalc()
                .calc(op.path, attr.file_type(), attr.dev, attr.ino);
            Ok(attr)
        })
    }

    /// Open an existing file on the first branch the search policy finds
    pub fn open(&self, caller: Caller, path: &Path, flags: i32) -> PoolResult<FileHandle> {
        self.run("open", path, caller, |op| {
            let targets = op.snap.select(self.backend.as_ref(), Func::Open, op.path)?;
            let target = targets.first();
            op.span.record_branch(target.root());

            let file = self.backend.open(&target.full_path, flags)?;
            Ok(self.handles.insert(HandleInfo::file(op.path, file)))
        })
    }

    /// Create a new file on the create policy's first pick
    ///
    /// The parent directories are cloned onto that branch first.
    pub fn create(&self, caller: Caller, path: &Path, mode: u32) -> PoolResult<FileHandle> {
        self.run("create", path, caller, |op| {
            let targets = op.snap.select(self.backend.as_ref(), Func::Create, op.path)?;
            let target = targets.first();
            op.span.record_branch(target.root());

            clone_path_as_root(self.backend.as_ref(), op.snap.branches(), target.root(), op.path)?;
            let file = self.backend.create(&target.full_path, mode)?;
            Ok(self.handles.insert(HandleInfo::file(op.path, file)))
        })
    }

    /// Close a file handle
    pub fn release(&self, fh: FileHandle) -> PoolResult<()> {
        let info = self.handles.remove(fh)?;
        tracing::trace!(%fh, path = %info.fusepath.display(), "released");
        Ok(())
    }

    /// Read up to `size` bytes at `offset`
    pub fn read(&self, fh: FileHandle, offset: u64, size: usize) -> PoolResult<Vec<u8>> {
        let info = self.handles.get(fh)?;
        let file = info.as_file()?;

        let mut buf = vec![0u8; size];
        let n = file
            .read_at(&mut buf, offset)
            .map_err(|e| PoolError::io(e, format!("read {}", info.fusepath.display())))?;
        buf.truncate(n);
        Ok(buf)
    }

    /// Write `data` at `offset`, returning the byte count written
    pub fn write(&self, fh: FileHandle, offset: u64, data: &[u8]) -> PoolResult<usize> {
        let info = self.handles.get(fh)?;
        info.as_file()?
            .write_at(data, offset)
            .map_err(|e| PoolError::io(e, format!("write {}", info.fusepath.display())))
    }

    pub fn fsync(&self, fh: FileHandle, datasync: bool) -> PoolResult<()> {
        let info = self.handles.get(fh)?;
        let file = info.as_file()?;
        let synced = if datasync { file.sync_data() } else { file.sync_all() };
        synced.map_err(|e| PoolError::io(e, format!("fsync {}", info.fusepath.display())))
    }
}
