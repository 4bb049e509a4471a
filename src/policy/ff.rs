/*!
 * First Found Policies
 */

use std::path::Path;

use super::predicates::{self, targets_of_found, targets_of_writable, PolicyCtx, Scan};
use super::{Policy, Target};
use crate::core::errors::PoolResult;

/// First eligible branch in branch order
///
/// Create ignores whether the parent exists; the caller clones it.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ff;

impl Policy for Ff {
    fn name(&self) -> &'static str {
        "ff"
    }

    fn search(&self, ctx: &PolicyCtx<'_>, fusepath: &Path) -> PoolResult<Vec<Target>> {
        predicates::search(ctx, fusepath, Scan::First).map(targets_of_found)
    }

    fn action(&self, ctx: &PolicyCtx<'_>, fusepath: &Path) -> PoolResult<Vec<Target>> {
        predicates::action(ctx, fusepath, Scan::First).map(targets_of_found)
    }

    fn create(&self, ctx: &PolicyCtx<'_>, fusepath: &Path) -> PoolResult<Vec<Target>> {
        predicates::create(ctx, fusepath, false, Scan::First).map(targets_of_writable)
    }
}

/// First eligible branch on which the parent already exists
#[derive(Debug, Default, Clone, Copy)]
pub struct EpFf;

impl Policy for EpFf {
    fn name(&self) -> &'static str {
        "epff"
    }

    fn path_preserving(&self) -> bool {
        true
    }

    fn search(&self, ctx: &PolicyCtx<'_>, fusepath: &Path) -> PoolResult<Vec<Target>> {
        Ff.search(ctx, fusepath)
    }

    fn action(&self, ctx: &PolicyCtx<'_>, fusepath: &Path) -> PoolResult<Vec<Target>> {
        Ff.action(ctx, fusepath)
    }

    fn create(&self, ctx: &PolicyCtx<'_>, fusepath: &Path) -> PoolResult<Vec<Target>> {
        predicates::create(ctx, fusepath, true, Scan::First).map(targets_of_writable)
    }
}
