/*!
 * Cross-Device Link Handling
 *
 * A hard link whose source lives on another branch than the one chosen for
 * the new name fails with EXDEV. Depending on configuration that error is
 * passed through or replaced by a symlink pointing back at the source.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::core::errors::{PoolError, PoolResult};
use crate::vfs::paths;

/// Strategy for EXDEV on `link`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkExdev {
    /// Return EXDEV to the caller
    #[default]
    Passthrough,
    /// Symlink relative to the new name's directory
    RelSymlink,
    /// Symlink to the source's absolute path on its branch
    AbsBaseSymlink,
    /// Symlink to the source's absolute path under the mountpoint
    AbsPoolSymlink,
}

impl LinkExdev {
    pub const fn as_str(self) -> &'static str {
        match self {
            LinkExdev::Passthrough => "passthrough",
            LinkExdev::RelSymlink => "rel-symlink",
            LinkExdev::AbsBaseSymlink => "abs-base-symlink",
            LinkExdev::AbsPoolSymlink => "abs-pool-symlink",
        }
    }

    /// Where the substitute symlink should point, `None` for passthrough
    pub fn symlink_target(
        self,
        branch_root: &Path,
        mountpoint: Option<&Path>,
        oldpath: &Path,
        newpath: &Path,
    ) -> PoolResult<Option<PathBuf>> {
        let target = match self {
            LinkExdev::Passthrough => return Ok(None),
            LinkExdev::RelSymlink => paths::relative(paths::parent(newpath), oldpath),
            LinkExdev::AbsBaseSymlink => paths::branch_path(branch_root, oldpath),
            LinkExdev::AbsPoolSymlink => {
                let mountpoint = mountpoint.ok_or_else(|| {
                    PoolError::InvalidArgument("abs-pool-symlink requires a mountpoint".to_string())
                })?;
                paths::branch_path(mountpoint, oldpath)
            }
        };
        Ok(Some(target))
    }
}

impl FromStr for LinkExdev {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "passthrough" => Ok(LinkExdev::Passthrough),
            "rel-symlink" => Ok(LinkExdev::RelSymlink),
            "abs-base-symlink" => Ok(LinkExdev::AbsBaseSymlink),
            "abs-pool-symlink" => Ok(LinkExdev::AbsPoolSymlink),
            other => Err(format!("invalid link-exdev value: {}", other)),
        }
    }
}

impl fmt::Display for LinkExdev {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Apply `strategy` after a link from `oldpath` to `newpath` hit EXDEV
///
/// `create_symlink(target, linkpath)` creates the substitute symlink through
/// the create policy. Passthrough returns `CrossDevice`.
pub fn resolve_link_exdev_failure<F>(
    strategy: LinkExdev,
    branch_root: &Path,
    mountpoint: Option<&Path>,
    oldpath: &Path,
    newpath: &Path,
    create_symlink: F,
) -> PoolResult<()>
where
    F: FnOnce(&Path, &Path) -> PoolResult<()>,
{
    match strategy.symlink_target(branch_root, mountpoint, oldpath, newpath)? {
        None => Err(PoolError::CrossDevice(format!(
            "{} -> {}",
            oldpath.display(),
            newpath.display()
        ))),
        Some(target) => {
            tracing::debug!(
                strategy = %strategy,
                target = %target.display(),
                link = %newpath.display(),
                "substituting symlink for cross-device link"
            );
            create_symlink(&target, newpath)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn target_for(strategy: LinkExdev) -> PoolResult<Option<PathBuf>> {
        strategy.symlink_target(
            Path::new("/mnt/disk1"),
            Some(Path::new("/mnt/pool")),
            Path::new("/a/b/file"),
            Path::new("/a/c/link"),
        )
    }

    #[test]
    fn test_parse() {
        for strategy in [
            LinkExdev::Passthrough,
            LinkExdev::RelSymlink,
            LinkExdev::AbsBaseSymlink,
            LinkExdev::AbsPoolSymlink,
        ] {
            assert_eq!(strategy.as_str().parse::<LinkExdev>().unwrap(), strategy);
        }
        assert!("symlink".parse::<LinkExdev>().is_err());
    }

    #[test]
    fn test_symlink_targets() {
        assert_eq!(target_for(LinkExdev::Passthrough).unwrap(), None);
        assert_eq!(
            target_for(LinkExdev::RelSymlink).unwrap(),
            Some(PathBuf::from("../b/file"))
        );
        assert_eq!(
            target_for(LinkExdev::AbsBaseSymlink).unwrap(),
            Some(PathBuf::from("/mnt/disk1/a/b/file"))
        );
        assert_eq!(
            target_for(LinkExdev::AbsPoolSymlink).unwrap(),
            Some(PathBuf::from("/mnt/pool/a/b/file"))
        );
    }

    #[test]
    fn test_pool_symlink_needs_mountpoint() {
        let err = LinkExdev::AbsPoolSymlink
            .symlink_target(Path::new("/b"), None, Path::new("/f"), Path::new("/g"))
            .unwrap_err();
        assert_eq!(err.errno(), libc::EINVAL);
    }

    #[test]
    fn test_passthrough_is_exdev() {
        let err = resolve_link_exdev_failure(
            LinkExdev::Passthrough,
            Path::new("/b"),
            None,
            Path::new("/f"),
            Path::new("/g"),
            |_, _| panic!("no symlink for passthrough"),
        )
        .unwrap_err();
        assert_eq!(err.errno(), libc::EXDEV);
    }
}
