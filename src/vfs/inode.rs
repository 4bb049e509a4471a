/*!
 * Synthetic Inodes
 * Stable inode numbers for merged entries, independent of the backing branch
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::str::FromStr;

use super::types::FileType;
use crate::core::types::{DevId, Ino};

/// Inode calculation algorithm
///
/// The same algorithm serves directory listings and attribute queries so
/// that `ls -i` and `stat` agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InodeCalc {
    /// Branch-local inode unchanged
    Passthrough,
    /// Hash of the logical path
    PathHash,
    PathHash32,
    /// Hash of (device, branch inode)
    DevinoHash,
    DevinoHash32,
    /// Directories by path, everything else by (device, inode) so hard
    /// links keep sharing an inode
    #[default]
    HybridHash,
    HybridHash32,
}

impl InodeCalc {
    pub const ALL: [InodeCalc; 7] = [
        InodeCalc::Passthrough,
        InodeCalc::PathHash,
        InodeCalc::PathHash32,
        InodeCalc::DevinoHash,
        InodeCalc::DevinoHash32,
        InodeCalc::HybridHash,
        InodeCalc::HybridHash32,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            InodeCalc::Passthrough => "passthrough",
            InodeCalc::PathHash => "path-hash",
            InodeCalc::PathHash32 => "path-hash32",
            InodeCalc::DevinoHash => "devino-hash",
            InodeCalc::DevinoHash32 => "devino-hash32",
            InodeCalc::HybridHash => "hybrid-hash",
            InodeCalc::HybridHash32 => "hybrid-hash32",
        }
    }

    /// Compute the synthetic inode for a logical path
    pub fn calc(self, fusepath: &Path, file_type: FileType, dev: DevId, ino: Ino) -> Ino {
        match self {
            InodeCalc::Passthrough => ino,
            InodeCalc::PathHash => path_hash(fusepath),
            InodeCalc::PathHash32 => fold32(path_hash(fusepath)),
            InodeCalc::DevinoHash => devino_hash(dev, ino),
            InodeCalc::DevinoHash32 => fold32(devino_hash(dev, ino)),
            InodeCalc::HybridHash => match file_type {
                FileType::Directory => path_hash(fusepath),
                _ => devino_hash(dev, ino),
            },
            InodeCalc::HybridHash32 => match file_type {
                FileType::Directory => fold32(path_hash(fusepath)),
                _ => fold32(devino_hash(dev, ino)),
            },
        }
    }
}

impl FromStr for InodeCalc {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InodeCalc::ALL
            .into_iter()
            .find(|calc| calc.as_str() == s)
            .ok_or_else(|| format!("unknown inodecalc '{}'", s))
    }
}

impl fmt::Display for InodeCalc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn digest64(hasher: blake3::Hasher) -> Ino {
    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    // 0 reads as "no inode" to readdir consumers
    u64::from_le_bytes(bytes).max(1)
}

fn path_hash(fusepath: &Path) -> Ino {
    let mut hasher = blake3::Hasher::new();
    hasher.update(fusepath.as_os_str().as_bytes());
    digest64(hasher)
}

fn devino_hash(dev: DevId, ino: Ino) -> Ino {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&dev.to_le_bytes());
    hasher.update(&ino.to_le_bytes());
    digest64(hasher)
}

#[inline]
fn fold32(h: Ino) -> Ino {
    (((h >> 32) ^ h) & 0xFFFF_FFFF).max(1)
}
