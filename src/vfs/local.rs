/*!
 * Local Filesystem Backend
 * Wraps std::fs and nix for host branch access
 */

use std::fs::{self, DirBuilder, File, OpenOptions};
use std::os::unix::fs::{DirBuilderExt, DirEntryExt, MetadataExt, OpenOptionsExt};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use nix::sys::stat::{utimensat, UtimensatFlags};
use nix::sys::statvfs::{statvfs, FsFlags};
use nix::sys::time::TimeSpec;

use super::traits::{Backend, DirStream};
use super::types::*;
use crate::core::errors::{PoolError, PoolResult};
use crate::core::types::{DevId, Gid, Uid};

/// Host filesystem implementation using std::fs
///
/// Stateless: paths are used exactly as given, so one instance serves every
/// branch of a pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFS;

impl LocalFS {
    pub fn new() -> Self {
        Self
    }

    /// Convert std::io::Error to PoolError with operation context
    fn io_error(e: std::io::Error, op: &str, path: &Path) -> PoolError {
        PoolError::io(e, format!("{} {}", op, path.display()))
    }

    fn timespec(t: SystemTime) -> TimeSpec {
        TimeSpec::from_duration(t.duration_since(UNIX_EPOCH).unwrap_or_default())
    }
}

impl Backend for LocalFS {
    fn lstat(&self, path: &Path) -> PoolResult<Attr> {
        fs::symlink_metadata(path)
            .map(|md| Attr::from_std(&md))
            .map_err(|e| Self::io_error(e, "lstat", path))
    }

    fn statvfs(&self, path: &Path) -> PoolResult<SpaceInfo> {
        let st = statvfs(path).map_err(|e| PoolError::sys(e, format!("statvfs {}", path.display())))?;
        let dev = fs::metadata(path)
            .map_err(|e| Self::io_error(e, "stat", path))?
            .dev();
        let frsize = st.fragment_size() as u64;

        Ok(SpaceInfo {
            dev,
            available: (st.blocks_available() as u64).saturating_mul(frsize),
            total: (st.blocks() as u64).saturating_mul(frsize),
            readonly: st.flags().contains(FsFlags::ST_RDONLY),
        })
    }

    fn open_dir(&self, path: &Path) -> PoolResult<Box<dyn DirStream>> {
        let md = fs::metadata(path).map_err(|e| Self::io_error(e, "opendir", path))?;
        let inner = fs::read_dir(path).map_err(|e| Self::io_error(e, "opendir", path))?;

        // An unreadable parent falls back to the directory itself
        let parent_ino = fs::metadata(path.join("..")).map(|p| p.ino()).unwrap_or(md.ino());
        let dots = vec![
            BranchEntry::new(".", md.ino(), FileType::Directory),
            BranchEntry::new("..", parent_ino, FileType::Directory),
        ];

        Ok(Box::new(LocalDirStream {
            dots: dots.into_iter(),
            inner,
            dev: md.dev(),
            path: path.to_path_buf(),
        }))
    }

    fn open(&self, path: &Path, flags: i32) -> PoolResult<File> {
        let mut opts = OpenOptions::new();
        match flags & libc::O_ACCMODE {
            libc::O_WRONLY => opts.write(true),
            libc::O_RDWR => opts.read(true).write(true),
            _ => opts.read(true),
        };
        opts.custom_flags(flags & !(libc::O_ACCMODE | libc::O_CREAT | libc::O_EXCL));

        opts.open(path).map_err(|e| Self::io_error(e, "open", path))
    }

    fn create(&self, path: &Path, mode: u32) -> PoolResult<File> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .mode(mode)
            .open(path)
            .map_err(|e| Self::io_error(e, "create", path))
    }

    fn mkdir(&self, path: &Path, mode: u32) -> PoolResult<()> {
        DirBuilder::new()
            .mode(mode)
            .create(path)
            .map_err(|e| Self::io_error(e, "mkdir", path))
    }

    fn rmdir(&self, path: &Path) -> PoolResult<()> {
        fs::remove_dir(path).map_err(|e| Self::io_error(e, "rmdir", path))
    }

    fn unlink(&self, path: &Path) -> PoolResult<()> {
        fs::remove_file(path).map_err(|e| Self::io_error(e, "unlink", path))
    }

    fn symlink(&self, target: &Path, linkpath: &Path) -> PoolResult<()> {
        std::os::unix::fs::symlink(target, linkpath)
            .map_err(|e| Self::io_error(e, "symlink", linkpath))
    }

    fn link(&self, oldpath: &Path, newpath: &Path) -> PoolResult<()> {
        fs::hard_link(oldpath, newpath).map_err(|e| Self::io_error(e, "link", newpath))
    }

    fn chmod(&self, path: &Path, mode: u32) -> PoolResult<()> {
        use std::os::unix::fs::PermissionsExt;

        fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
            .map_err(|e| Self::io_error(e, "chmod", path))
    }

    fn chown(&self, path: &Path, uid: Uid, gid: Gid) -> PoolResult<()> {
        std::os::unix::fs::lchown(path, Some(uid), Some(gid))
            .map_err(|e| Self::io_error(e, "chown", path))
    }

    fn utimens(&self, path: &Path, atime: SystemTime, mtime: SystemTime) -> PoolResult<()> {
        utimensat(
            None,
            path,
            &Self::timespec(atime),
            &Self::timespec(mtime),
            UtimensatFlags::NoFollowSymlink,
        )
        .map_err(|e| PoolError::sys(e, format!("utimens {}", path.display())))
    }

    fn name(&self) -> &str {
        "local"
    }
}

/// Directory stream over `std::fs::ReadDir`
///
/// `std::fs` skips `.` and `..`, so they are yielded first from the
/// directory's own metadata.
struct LocalDirStream {
    dots: std::vec::IntoIter<BranchEntry>,
    inner: fs::ReadDir,
    dev: DevId,
    path: PathBuf,
}

impl Iterator for LocalDirStream {
    type Item = PoolResult<BranchEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(dot) = self.dots.next() {
            return Some(Ok(dot));
        }
        let entry = match self.inner.next()? {
            Ok(entry) => entry,
            Err(e) => return Some(Err(LocalFS::io_error(e, "readdir", &self.path))),
        };
        let file_type = entry
            .file_type()
            .map(FileType::from_std)
            .unwrap_or_default();

        Some(Ok(BranchEntry::new(entry.file_name(), entry.ino(), file_type)))
    }
}

impl DirStream for LocalDirStream {
    fn dev(&self) -> DevId {
        self.dev
    }
}
