/*!
 * VFS File Type Enum
 * Defines the type of filesystem objects and their on-disk encodings
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// File type enumeration with complete serde support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    File,
    Directory,
    Symlink,
    #[serde(rename = "block_device")]
    BlockDevice,
    #[serde(rename = "char_device")]
    CharDevice,
    Fifo,
    Socket,
    Unknown,
}

impl Default for FileType {
    fn default() -> Self {
        Self::Unknown
    }
}

impl FileType {
    /// Decode the `S_IFMT` bits of a `st_mode`
    pub const fn from_mode(mode: u32) -> Self {
        match mode & libc::S_IFMT as u32 {
            m if m == libc::S_IFREG as u32 => FileType::File,
            m if m == libc::S_IFDIR as u32 => FileType::Directory,
            m if m == libc::S_IFLNK as u32 => FileType::Symlink,
            m if m == libc::S_IFBLK as u32 => FileType::BlockDevice,
            m if m == libc::S_IFCHR as u32 => FileType::CharDevice,
            m if m == libc::S_IFIFO as u32 => FileType::Fifo,
            m if m == libc::S_IFSOCK as u32 => FileType::Socket,
            _ => FileType::Unknown,
        }
    }

    /// `S_IFMT` bits for this type (`DTTOIF`); zero when unknown
    pub const fn to_mode(self) -> u32 {
        (match self {
            FileType::File => libc::S_IFREG,
            FileType::Directory => libc::S_IFDIR,
            FileType::Symlink => libc::S_IFLNK,
            FileType::BlockDevice => libc::S_IFBLK,
            FileType::CharDevice => libc::S_IFCHR,
            FileType::Fifo => libc::S_IFIFO,
            FileType::Socket => libc::S_IFSOCK,
            FileType::Unknown => 0,
        }) as u32
    }

    /// Convert from std's file type as reported by `readdir`/`lstat`
    pub fn from_std(ft: std::fs::FileType) -> Self {
        use std::os::unix::fs::FileTypeExt;

        if ft.is_dir() {
            FileType::Directory
        } else if ft.is_symlink() {
            FileType::Symlink
        } else if ft.is_file() {
            FileType::File
        } else if ft.is_block_device() {
            FileType::BlockDevice
        } else if ft.is_char_device() {
            FileType::CharDevice
        } else if ft.is_fifo() {
            FileType::Fifo
        } else if ft.is_socket() {
            FileType::Socket
        } else {
            FileType::Unknown
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FileType::File => write!(f, "file"),
            FileType::Directory => write!(f, "directory"),
            FileType::Symlink => write!(f, "symlink"),
            FileType::BlockDevice => write!(f, "block device"),
            FileType::CharDevice => write!(f, "char device"),
            FileType::Fifo => write!(f, "fifo"),
            FileType::Socket => write!(f, "socket"),
            FileType::Unknown => write!(f, "unknown"),
        }
    }
}
