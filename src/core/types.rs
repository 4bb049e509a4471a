/*!
 * Core Types
 * Common types used across the pool
 */

use serde::{Deserialize, Serialize};

/// User ID type
pub type Uid = u32;

/// Group ID type
pub type Gid = u32;

/// Device ID type
pub type DevId = u64;

/// Inode number type
pub type Ino = u64;

/// Identity of the process on whose behalf an operation runs
///
/// Supplied by the dispatch layer from the kernel request context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Caller {
    pub uid: Uid,
    pub gid: Gid,
    #[serde(default)]
    pub pid: u32,
}

impl Caller {
    pub const fn new(uid: Uid, gid: Gid) -> Self {
        Self { uid, gid, pid: 0 }
    }

    /// The superuser
    pub const fn root() -> Self {
        Self::new(0, 0)
    }

    /// The identity this process currently runs under
    pub fn current() -> Self {
        Self::new(
            nix::unistd::geteuid().as_raw(),
            nix::unistd::getegid().as_raw(),
        )
        .with_pid(std::process::id())
    }

    #[inline]
    pub const fn with_pid(mut self, pid: u32) -> Self {
        self.pid = pid;
        self
    }
}
