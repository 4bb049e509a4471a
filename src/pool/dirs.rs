/*!
 * Directory Operations
 */

use std::path::Path;
use std::sync::Arc;

use super::PoolFs;
use crate::config::Func;
use crate::core::errors::{PoolError, PoolResult};
use crate::core::types::Caller;
use crate::handles::{FileHandle, HandleInfo};
use crate::readdir::DirEntries;
use crate::vfs::clonepath::clone_path_as_root;

impl PoolFs {
    /// Open a logical directory
    pub fn opendir(&self, caller: Caller, path: &Path) -> PoolResult<FileHandle> {
        self.run("opendir", path, caller, |op| {
            let targets = op.snap.select(self.backend.as_ref(), Func::Opendir, op.path)?;
            let attr = self.backend.lstat(&targets.first().full_path)?;
            if !attr.is_dir() {
                return Err(PoolError::sys(
                    nix::errno::Errno::ENOTDIR,
                    format!("opendir {}", op.path.display()),
                ));
            }
            Ok(self.handles.insert(HandleInfo::dir(op.path)))
        })
    }

    /// Fill `buf` with the merged listing of an open directory
    pub fn readdir(&self, caller: Caller, fh: FileHandle, buf: &mut DirEntries) -> PoolResult<()> {
        let info = self.handles.get(fh)?;
        if !info.is_dir() {
            return Err(PoolError::sys(
                nix::errno::Errno::ENOTDIR,
                format!("readdir {}", info.fusepath.display()),
            ));
        }

        self.run("readdir", &info.fusepath, caller, |op| {
            op.snap
                .merger
                .merge_readdir(op.snap.branches(), op.path, op.caller, buf)
        })
    }

    pub fn releasedir(&self, fh: FileHandle) -> PoolResult<()> {
        self.handles.remove(fh).map(|_| ())
    }

    /// Create a directory on every branch the create policy picks
    pub fn mkdir(&self, caller: Caller, path: &Path, mode: u32) -> PoolResult<()> {
        self.run("mkdir", path, caller, |op| {
            let branches = Arc::clone(op.snap.branches());
            let fusepath = op.path.to_path_buf();
            self.broadcast(op, Func::Mkdir, move |backend, target| {
                clone_path_as_root(backend, &branches, target.root(), &fusepath)?;
                backend.mkdir(&target.full_path, mode)
            })
        })
    }

    /// Remove a directory from every branch the action policy picks
    pub fn rmdir(&self, caller: Caller, path: &Path) -> PoolResult<()> {
        self.run("rmdir", path, caller, |op| {
            self.broadcast(op, Func::Rmdir, |backend, target| backend.rmdir(&target.full_path))
        })
    }
}
