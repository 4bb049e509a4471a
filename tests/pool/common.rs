/*!
 * Shared test fixtures
 * Temp-dir branch pools and a fault-injecting backend
 */

#![allow(dead_code)]

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;
use tempfile::TempDir;

use poolfs::core::types::{Gid, Uid};
use poolfs::vfs::{Backend, DirStream, LocalFS};
use poolfs::{Attr, Branch, BranchSet, Config, PoolError, PoolResult, SpaceInfo};

/// A set of temp directories used as branches
pub struct Branches {
    dirs: Vec<TempDir>,
}

impl Branches {
    pub fn new(count: usize) -> Self {
        Self {
            dirs: (0..count).map(|_| TempDir::new().unwrap()).collect(),
        }
    }

    pub fn root(&self, index: usize) -> &Path {
        self.dirs[index].path()
    }

    /// Branch path for `rel` on branch `index`
    pub fn path(&self, index: usize, rel: &str) -> PathBuf {
        self.root(index).join(rel.trim_start_matches('/'))
    }

    pub fn mkdir(&self, index: usize, rel: &str) {
        std::fs::create_dir_all(self.path(index, rel)).unwrap();
    }

    pub fn write(&self, index: usize, rel: &str, data: &[u8]) {
        let path = self.path(index, rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, data).unwrap();
    }

    pub fn set(&self) -> BranchSet {
        BranchSet::from_branches(self.dirs.iter().map(|d| Branch::rw(d.path())).collect()).unwrap()
    }

    /// Config over every branch with the space threshold disabled
    pub fn config(&self) -> Config {
        Config::new(self.set()).with_min_free_space(0)
    }
}

/// Backend wrapping [`LocalFS`] with injected delays and failures
///
/// Rules match on branch path prefixes.
#[derive(Default)]
pub struct FaultFs {
    inner: LocalFS,
    dir_delay: Vec<(PathBuf, Duration)>,
    failing_chmod: Vec<PathBuf>,
    link_exdev: bool,
    calls: Mutex<Vec<(&'static str, PathBuf)>>,
}

impl FaultFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep before opening any directory under `root`
    pub fn with_dir_delay(mut self, root: &Path, delay: Duration) -> Self {
        self.dir_delay.push((root.to_path_buf(), delay));
        self
    }

    /// Fail chmod under `root` with EIO
    pub fn with_failing_chmod(mut self, root: &Path) -> Self {
        self.failing_chmod.push(root.to_path_buf());
        self
    }

    /// Every hard link fails with EXDEV
    pub fn with_link_exdev(mut self) -> Self {
        self.link_exdev = true;
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Paths a given primitive was called with, in call order
    pub fn calls(&self, op: &str) -> Vec<PathBuf> {
        self.calls
            .lock()
            .iter()
            .filter(|(name, _)| *name == op)
            .map(|(_, path)| path.clone())
            .collect()
    }

    fn record(&self, op: &'static str, path: &Path) {
        self.calls.lock().push((op, path.to_path_buf()));
    }
}

impl Backend for FaultFs {
    fn lstat(&self, path: &Path) -> PoolResult<Attr> {
        self.inner.lstat(path)
    }

    fn statvfs(&self, path: &Path) -> PoolResult<SpaceInfo> {
        self.inner.statvfs(path)
    }

    fn open_dir(&self, path: &Path) -> PoolResult<Box<dyn DirStream>> {
        self.record("open_dir", path);
        if let Some((_, delay)) = self.dir_delay.iter().find(|(root, _)| path.starts_with(root)) {
            thread::sleep(*delay);
        }
        self.inner.open_dir(path)
    }

    fn open(&self, path: &Path, flags: i32) -> PoolResult<File> {
        self.inner.open(path, flags)
    }

    fn create(&self, path: &Path, mode: u32) -> PoolResult<File> {
        self.record("create", path);
        self.inner.create(path, mode)
    }

    fn mkdir(&self, path: &Path, mode: u32) -> PoolResult<()> {
        self.record("mkdir", path);
        self.inner.mkdir(path, mode)
    }

    fn rmdir(&self, path: &Path) -> PoolResult<()> {
        self.inner.rmdir(path)
    }

    fn unlink(&self, path: &Path) -> PoolResult<()> {
        self.inner.unlink(path)
    }

    fn symlink(&self, target: &Path, linkpath: &Path) -> PoolResult<()> {
        self.record("symlink", linkpath);
        self.inner.symlink(target, linkpath)
    }

    fn link(&self, oldpath: &Path, newpath: &Path) -> PoolResult<()> {
        self.record("link", newpath);
        if self.link_exdev {
            return Err(PoolError::sys(nix::errno::Errno::EXDEV, "link"));
        }
        self.inner.link(oldpath, newpath)
    }

    fn chmod(&self, path: &Path, mode: u32) -> PoolResult<()> {
        self.record("chmod", path);
        if self.failing_chmod.iter().any(|root| path.starts_with(root)) {
            return Err(PoolError::sys(nix::errno::Errno::EIO, "chmod"));
        }
        self.inner.chmod(path, mode)
    }

    fn chown(&self, path: &Path, uid: Uid, gid: Gid) -> PoolResult<()> {
        self.inner.chown(path, uid, gid)
    }

    fn utimens(&self, path: &Path, atime: SystemTime, mtime: SystemTime) -> PoolResult<()> {
        self.inner.utimens(path, atime, mtime)
    }

    fn name(&self) -> &str {
        "faultfs"
    }
}
