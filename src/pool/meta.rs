/*!
 * Metadata Operations
 * Broadcast-class operations over the action policy's targets
 */

use std::path::Path;
use std::time::SystemTime;

use super::PoolFs;
use crate::config::Func;
use crate::core::errors::PoolResult;
use crate::core::types::{Caller, Gid, Uid};
use crate::handles::FileHandle;
use crate::policy::Target;
use crate::vfs::traits::Backend;

impl PoolFs {
    pub fn unlink(&self, caller: Caller, path: &Path) -> PoolResult<()> {
        self.run("unlink", path, caller, |op| {
            self.broadcast(op, Func::Unlink, |backend, target| backend.unlink(&target.full_path))
        })
    }

    pub fn chmod(&self, caller: Caller, path: &Path, mode: u32) -> PoolResult<()> {
        self.run("chmod", path, caller, |op| {
            self.broadcast(op, Func::Chmod, move |backend, target| {
                backend.chmod(&target.full_path, mode)
            })
        })
    }

    pub fn chown(&self, caller: Caller, path: &Path, uid: Uid, gid: Gid) -> PoolResult<()> {
        self.run("chown", path, caller, |op| {
            self.broadcast(op, Func::Chown, move |backend, target| {
                backend.chown(&target.full_path, uid, gid)
            })
        })
    }

    pub fn utimens(
        &self,
        caller: Caller,
        path: &Path,
        atime: SystemTime,
        mtime: SystemTime,
    ) -> PoolResult<()> {
        self.run("utimens", path, caller, |op| {
            self.broadcast(op, Func::Utimens, move |backend, target| {
                backend.utimens(&target.full_path, atime, mtime)
            })
        })
    }

    /// Run a device-specific control call on every copy of an open file
    ///
    /// `primitive` receives each branch path the action policy picks for the
    /// handle's logical path.
    pub fn ioctl<T, F>(&self, caller: Caller, fh: FileHandle, primitive: F) -> PoolResult<T>
    where
        T: Send + 'static,
        F: Fn(&dyn Backend, &Target) -> PoolResult<T> + Send + Sync + 'static,
    {
        let info = self.handles.get(fh)?;
        self.run("ioctl", &info.fusepath, caller, |op| {
            self.broadcast(op, Func::Ioctl, primitive)
        })
    }
}
