/*!
 * VFS Traits
 * Single-syscall primitives the policy engine runs against branch paths
 */

use std::fs::File;
use std::path::Path;
use std::time::SystemTime;

use super::types::*;
use crate::core::errors::PoolResult;
use crate::core::types::{DevId, Gid, Uid};

/// Branch filesystem primitives
///
/// Every path handed to a backend is a full branch path (branch root joined
/// with the logical path). Implementations perform exactly one underlying
/// operation per call and report failures with the OS errno preserved; they
/// never consult the branch set themselves.
pub trait Backend: Send + Sync {
    /// Attributes without following a final symlink
    fn lstat(&self, path: &Path) -> PoolResult<Attr>;

    /// Free space of the filesystem holding `path`
    fn statvfs(&self, path: &Path) -> PoolResult<SpaceInfo>;

    /// Open a directory for enumeration
    fn open_dir(&self, path: &Path) -> PoolResult<Box<dyn DirStream>>;

    /// Open an existing file
    fn open(&self, path: &Path, flags: i32) -> PoolResult<File>;

    /// Create a new file exclusively and open it for writing
    fn create(&self, path: &Path, mode: u32) -> PoolResult<File>;

    /// Create a single directory (parent must exist)
    fn mkdir(&self, path: &Path, mode: u32) -> PoolResult<()>;

    /// Remove an empty directory
    fn rmdir(&self, path: &Path) -> PoolResult<()>;

    /// Remove a non-directory
    fn unlink(&self, path: &Path) -> PoolResult<()>;

    /// Create symbolic link `linkpath` pointing at `target`
    fn symlink(&self, target: &Path, linkpath: &Path) -> PoolResult<()>;

    /// Create hard link `newpath` to `oldpath`
    fn link(&self, oldpath: &Path, newpath: &Path) -> PoolResult<()>;

    /// Set permission bits
    fn chmod(&self, path: &Path, mode: u32) -> PoolResult<()>;

    /// Set owner and group without following a final symlink
    fn chown(&self, path: &Path, uid: Uid, gid: Gid) -> PoolResult<()>;

    /// Set access and modification times without following a final symlink
    fn utimens(&self, path: &Path, atime: SystemTime, mtime: SystemTime) -> PoolResult<()>;

    /// Backend name for logs
    fn name(&self) -> &str;

    /// Check if a path exists on the branch
    fn exists(&self, path: &Path) -> bool {
        self.lstat(path).is_ok()
    }
}

/// Open directory stream
///
/// Yields entries in filesystem enumeration order. The underlying handle is
/// closed when the stream is dropped.
pub trait DirStream: Iterator<Item = PoolResult<BranchEntry>> + Send {
    /// Device id of the opened directory
    fn dev(&self) -> DevId;
}
