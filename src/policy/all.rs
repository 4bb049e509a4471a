/*!
 * All-Branches Policies
 */

use std::path::Path;

use super::predicates::{self, targets_of_found, targets_of_writable, PolicyCtx, Scan};
use super::{Policy, Target};
use crate::core::errors::PoolResult;

/// Every eligible branch, in branch order
#[derive(Debug, Default, Clone, Copy)]
pub struct All;

impl Policy for All {
    fn name(&self) -> &'static str {
        "all"
    }

    fn search(&self, ctx: &PolicyCtx<'_>, fusepath: &Path) -> PoolResult<Vec<Target>> {
        predicates::search(ctx, fusepath, Scan::All).map(targets_of_found)
    }

    fn action(&self, ctx: &PolicyCtx<'_>, fusepath: &Path) -> PoolResult<Vec<Target>> {
        predicates::action(ctx, fusepath, Scan::All).map(targets_of_found)
    }

    fn create(&self, ctx: &PolicyCtx<'_>, fusepath: &Path) -> PoolResult<Vec<Target>> {
        predicates::create(ctx, fusepath, false, Scan::All).map(targets_of_writable)
    }
}

/// Every eligible branch on which the parent already exists
#[derive(Debug, Default, Clone, Copy)]
pub struct EpAll;

impl Policy for EpAll {
    fn name(&self) -> &'static str {
        "epall"
    }

    fn path_preserving(&self) -> bool {
        true
    }

    fn search(&self, ctx: &PolicyCtx<'_>, fusepath: &Path) -> PoolResult<Vec<Target>> {
        All.search(ctx, fusepath)
    }

    fn action(&self, ctx: &PolicyCtx<'_>, fusepath: &Path) -> PoolResult<Vec<Target>> {
        All.action(ctx, fusepath)
    }

    fn create(&self, ctx: &PolicyCtx<'_>, fusepath: &Path) -> PoolResult<Vec<Target>> {
        predicates::create(ctx, fusepath, true, Scan::All).map(targets_of_writable)
    }
}
