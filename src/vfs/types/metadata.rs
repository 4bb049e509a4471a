/*!
 * VFS Metadata
 * Attribute snapshot of a branch file and free-space figures of a branch
 */

use super::file_type::FileType;
use crate::core::types::{DevId, Gid, Ino, Uid};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Attributes of one file on one branch (an `lstat` result)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Attr {
    pub ino: Ino,
    pub dev: DevId,
    /// Full `st_mode`: type bits and permission bits
    pub mode: u32,
    pub nlink: u64,
    pub uid: Uid,
    pub gid: Gid,
    pub size: u64,
    pub atime: SystemTime,
    pub mtime: SystemTime,
    pub ctime: SystemTime,
}

impl Attr {
    /// Build from std metadata (`symlink_metadata`)
    pub fn from_std(md: &std::fs::Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;

        Self {
            ino: md.ino(),
            dev: md.dev(),
            mode: md.mode(),
            nlink: md.nlink(),
            uid: md.uid(),
            gid: md.gid(),
            size: md.size(),
            atime: unix_time(md.atime(), md.atime_nsec()),
            mtime: unix_time(md.mtime(), md.mtime_nsec()),
            ctime: unix_time(md.ctime(), md.ctime_nsec()),
        }
    }

    #[inline]
    #[must_use]
    pub const fn file_type(&self) -> FileType {
        FileType::from_mode(self.mode)
    }

    /// Check if this is a directory
    ///
    /// # Performance
    /// Hot path - called for every component during path cloning
    #[inline(always)]
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        matches!(self.file_type(), FileType::Directory)
    }

    /// Permission bits only
    #[inline]
    #[must_use]
    pub const fn permissions(&self) -> u32 {
        self.mode & 0o7777
    }
}

fn unix_time(secs: i64, nsecs: i64) -> SystemTime {
    if secs >= 0 {
        UNIX_EPOCH + Duration::new(secs as u64, nsecs as u32)
    } else {
        UNIX_EPOCH - Duration::from_secs(secs.unsigned_abs())
    }
}

/// Free-space figures for a branch filesystem (a `statvfs` result)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpaceInfo {
    pub dev: DevId,
    /// Bytes available to unprivileged users
    pub available: u64,
    /// Total bytes
    pub total: u64,
    /// Mounted read-only
    pub readonly: bool,
}
