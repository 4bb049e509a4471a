/*!
 * Path Cloning
 * Recreate a logical path's parent directories on a branch that lacks them
 */

use std::path::Path;

use super::paths;
use super::traits::Backend;
use super::types::Attr;
use crate::branches::BranchSet;
use crate::core::errors::{PoolError, PoolResult};
use crate::security::CredentialScope;

/// Clone the parent directories of `fusepath` onto the branch at `target_root`
///
/// Components are walked from the root down. A component already present on
/// the target is left alone; a missing one is created with the mode, owner
/// and timestamps of the first branch (in set order) that has it. Prefixes
/// created before a failure are not removed.
pub fn clone_path(
    backend: &dyn Backend,
    branches: &BranchSet,
    target_root: &Path,
    fusepath: &Path,
) -> PoolResult<()> {
    for dir in paths::parent_chain(fusepath) {
        let target = paths::branch_path(target_root, &dir);
        if backend.exists(&target) {
            continue;
        }

        let source = find_source(backend, branches, target_root, &dir)?;
        clone_dir(backend, &source, &target)?;
        tracing::debug!(
            branch = %target_root.display(),
            path = %dir.display(),
            mode = format_args!("{:o}", source.permissions()),
            "cloned directory"
        );
    }
    Ok(())
}

/// [`clone_path`] with root privileges so ownership can be reproduced
///
/// An unprivileged process cannot elevate and clones with its own ids.
pub fn clone_path_as_root(
    backend: &dyn Backend,
    branches: &BranchSet,
    target_root: &Path,
    fusepath: &Path,
) -> PoolResult<()> {
    let _scope = if nix::unistd::getuid().is_root() {
        Some(CredentialScope::root()?)
    } else {
        None
    };
    clone_path(backend, branches, target_root, fusepath)
}

fn find_source(
    backend: &dyn Backend,
    branches: &BranchSet,
    target_root: &Path,
    dir: &Path,
) -> PoolResult<Attr> {
    branches
        .iter()
        .filter(|branch| branch.root() != target_root)
        .find_map(|branch| {
            backend
                .lstat(&paths::branch_path(branch.root(), dir))
                .ok()
                .filter(Attr::is_dir)
        })
        .ok_or_else(|| PoolError::NotFound(format!("{} on any branch", dir.display())))
}

fn clone_dir(backend: &dyn Backend, source: &Attr, target: &Path) -> PoolResult<()> {
    match backend.mkdir(target, source.permissions()) {
        Ok(()) => {}
        // Raced with another creator
        Err(e) if e.errno() == libc::EEXIST => return Ok(()),
        Err(e) => return Err(e),
    }

    // mkdir is subject to the umask
    backend.chmod(target, source.permissions())?;
    chown_checked(backend, source, target)?;
    backend.utimens(target, source.atime, source.mtime)
}

/// chown that only fails if the ownership actually ended up wrong
fn chown_checked(backend: &dyn Backend, source: &Attr, target: &Path) -> PoolResult<()> {
    let err = match backend.chown(target, source.uid, source.gid) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };

    match backend.lstat(target) {
        Ok(attr) if attr.uid == source.uid && attr.gid == source.gid => Ok(()),
        _ => Err(err),
    }
}
