/*!
 * Branch Eligibility
 * Per-category filters shared by every policy, with error precedence
 */

use std::path::Path;

use super::Target;
use crate::branches::{Branch, BranchSet};
use crate::core::errors::{PoolError, PoolResult};
use crate::vfs::paths;
use crate::vfs::traits::Backend;
use crate::vfs::types::{Attr, SpaceInfo};

/// What a policy evaluates against
#[derive(Clone, Copy)]
pub struct PolicyCtx<'a> {
    pub backend: &'a dyn Backend,
    pub branches: &'a BranchSet,
    /// Pool-wide minimum free space, overridden per branch
    pub min_free_space: u64,
}

impl<'a> PolicyCtx<'a> {
    pub fn new(backend: &'a dyn Backend, branches: &'a BranchSet, min_free_space: u64) -> Self {
        Self {
            backend,
            branches,
            min_free_space,
        }
    }

    fn min_free_space_of(&self, branch: &Branch) -> u64 {
        branch.min_free_space.unwrap_or(self.min_free_space)
    }
}

/// Stop after the first eligible branch or scan them all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Scan {
    First,
    All,
}

/// Branch on which the path exists
#[derive(Debug)]
pub(super) struct Found {
    pub target: Target,
    pub attr: Attr,
}

/// Branch that may receive a new path
#[derive(Debug)]
pub(super) struct Writable {
    pub target: Target,
    pub space: SpaceInfo,
}

/// Why branches were passed over, for the error when none is left
#[derive(Debug, Default)]
struct Exclusions {
    mode: bool,
    space: bool,
}

impl Exclusions {
    /// Mode beats space beats absence
    fn into_error(self, category: &str, fusepath: &Path) -> PoolError {
        let path = fusepath.display();
        if self.mode {
            PoolError::PermissionDenied(format!("no writable branch to {} {}", category, path))
        } else if self.space {
            PoolError::OutOfSpace(format!("no branch with enough free space for {}", path))
        } else {
            PoolError::NotFound(format!("no branch to {} {}", category, path))
        }
    }
}

fn finish<T>(found: Vec<T>, excluded: Exclusions, category: &str, fusepath: &Path) -> PoolResult<Vec<T>> {
    if found.is_empty() {
        Err(excluded.into_error(category, fusepath))
    } else {
        Ok(found)
    }
}

/// Branches where `fusepath` exists; mode is irrelevant
pub(super) fn search(ctx: &PolicyCtx<'_>, fusepath: &Path, scan: Scan) -> PoolResult<Vec<Found>> {
    let mut found = Vec::new();
    for branch in ctx.branches {
        let target = Target::new(branch, fusepath);
        if let Ok(attr) = ctx.backend.lstat(&target.full_path) {
            found.push(Found { target, attr });
            if scan == Scan::First {
                break;
            }
        }
    }
    finish(found, Exclusions::default(), "find", fusepath)
}

/// Branches where `fusepath` exists and which accept changes
pub(super) fn action(ctx: &PolicyCtx<'_>, fusepath: &Path, scan: Scan) -> PoolResult<Vec<Found>> {
    let mut found = Vec::new();
    let mut excluded = Exclusions::default();

    for branch in ctx.branches {
        let target = Target::new(branch, fusepath);
        let attr = match ctx.backend.lstat(&target.full_path) {
            Ok(attr) => attr,
            Err(_) => continue,
        };
        if !branch.mode.allows_action() {
            excluded.mode = true;
            continue;
        }

        found.push(Found { target, attr });
        if scan == Scan::First {
            break;
        }
    }
    finish(found, excluded, "modify", fusepath)
}

/// Branches that may receive `fusepath`
///
/// Checked in order: branch mode, parent existence (when `existing_parent`),
/// read-only mount, free space. A branch whose space cannot be queried is
/// skipped.
pub(super) fn create(
    ctx: &PolicyCtx<'_>,
    fusepath: &Path,
    existing_parent: bool,
    scan: Scan,
) -> PoolResult<Vec<Writable>> {
    let parent = paths::parent(fusepath);
    let mut found = Vec::new();
    let mut excluded = Exclusions::default();

    for branch in ctx.branches {
        if !branch.mode.allows_create() {
            excluded.mode = true;
            continue;
        }
        if existing_parent && !ctx.backend.exists(&paths::branch_path(branch.root(), parent)) {
            continue;
        }

        let space = match ctx.backend.statvfs(branch.root()) {
            Ok(space) => space,
            Err(e) => {
                tracing::debug!(branch = %branch.path.display(), error = %e, "statvfs failed, branch skipped");
                continue;
            }
        };
        if space.readonly {
            excluded.mode = true;
            continue;
        }
        if space.available < ctx.min_free_space_of(branch) {
            excluded.space = true;
            continue;
        }

        found.push(Writable {
            target: Target::new(branch, fusepath),
            space,
        });
        if scan == Scan::First {
            break;
        }
    }
    finish(found, excluded, "create", fusepath)
}

pub(super) fn targets_of_found(found: Vec<Found>) -> Vec<Target> {
    found.into_iter().map(|f| f.target).collect()
}

pub(super) fn targets_of_writable(writable: Vec<Writable>) -> Vec<Target> {
    writable.into_iter().map(|w| w.target).collect()
}
