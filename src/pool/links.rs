/*!
 * Link Operations
 * symlink and hard link, including the cross-device fallback
 */

use std::path::Path;
use std::sync::Arc;

use nix::errno::Errno;

use super::{Op, PoolFs};
use crate::config::Func;
use crate::core::errors::{PoolError, PoolResult};
use crate::core::types::Caller;
use crate::link::resolve_link_exdev_failure;
use crate::policy::Target;
use crate::vfs::clonepath::clone_path_as_root;
use crate::vfs::paths;

impl PoolFs {
    /// Create symlink `linkpath` pointing at `target`
    ///
    /// `target` is stored verbatim. A branch whose parent directory is
    /// missing gets it cloned and the symlink is retried once.
    pub fn symlink(&self, caller: Caller, target: &Path, linkpath: &Path) -> PoolResult<()> {
        self.run("symlink", linkpath, caller, |op| self.symlink_in(op, target))
    }

    /// Hard link `newpath` to `oldpath`
    ///
    /// A path-preserving create policy links on the branch holding
    /// `oldpath`. Any other create policy picks the branch for `newpath`, and
    /// a branch other than the source is EXDEV. EXDEV, whether decided here
    /// or returned by the branch, is handled by the configured link-exdev
    /// strategy.
    pub fn link(&self, caller: Caller, oldpath: &Path, newpath: &Path) -> PoolResult<()> {
        let newpath = paths::normalize(newpath);
        self.run("link", oldpath, caller, |op| {
            let found = op.snap.select(self.backend.as_ref(), Func::Link, op.path)?;
            let source = found.first();
            op.span.record_branch(source.root());

            let linked = if op.snap.config().policy(Func::Create).path_preserving() {
                self.link_on(op, source, &newpath)
            } else {
                let chosen = op.snap.select(self.backend.as_ref(), Func::Create, &newpath)?;
                if chosen.first().root() == source.root() {
                    self.link_on(op, source, &newpath)
                } else {
                    Err(PoolError::sys(
                        Errno::EXDEV,
                        format!("link {} -> {}", op.path.display(), newpath.display()),
                    ))
                }
            };

            match linked {
                Err(e) if e.errno() == libc::EXDEV => {
                    let config = op.snap.config();
                    resolve_link_exdev_failure(
                        config.link_exdev(),
                        source.root(),
                        config.mountpoint(),
                        op.path,
                        &newpath,
                        |target, linkpath| {
                            let link_op = Op {
                                snap: op.snap,
                                path: linkpath,
                                caller: op.caller,
                                span: op.span,
                            };
                            self.symlink_in(&link_op, target)
                        },
                    )
                }
                result => result,
            }
        })
    }

    fn link_on(&self, op: &Op<'_>, source: &Target, newpath: &Path) -> PoolResult<()> {
        clone_path_as_root(self.backend.as_ref(), op.snap.branches(), source.root(), newpath)?;
        self.backend
            .link(&source.full_path, &paths::branch_path(source.root(), newpath))
    }

    fn symlink_in(&self, op: &Op<'_>, target: &Path) -> PoolResult<()> {
        let branches = Arc::clone(op.snap.branches());
        let fusepath = op.path.to_path_buf();
        let target = target.to_path_buf();

        self.broadcast(op, Func::Symlink, move |backend, dest| {
            match backend.symlink(&target, &dest.full_path) {
                Err(e) if e.is_not_found() => {
                    clone_path_as_root(backend, &branches, dest.root(), &fusepath)?;
                    backend.symlink(&target, &dest.full_path)
                }
                result => result,
            }
        })
    }
}
