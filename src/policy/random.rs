/*!
 * Random Policies
 * Uniform pick among what `all` / `epall` would return
 */

use rand::Rng;
use std::path::Path;

use super::all::{All, EpAll};
use super::{Policy, PolicyCtx, Target};
use crate::core::errors::PoolResult;

fn pick(mut targets: Vec<Target>) -> Vec<Target> {
    if targets.len() > 1 {
        let idx = rand::thread_rng().gen_range(0..targets.len());
        vec![targets.swap_remove(idx)]
    } else {
        targets
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Rand;

impl Policy for Rand {
    fn name(&self) -> &'static str {
        "rand"
    }

    fn search(&self, ctx: &PolicyCtx<'_>, fusepath: &Path) -> PoolResult<Vec<Target>> {
        All.search(ctx, fusepath).map(pick)
    }

    fn action(&self, ctx: &PolicyCtx<'_>, fusepath: &Path) -> PoolResult<Vec<Target>> {
        All.action(ctx, fusepath).map(pick)
    }

    fn create(&self, ctx: &PolicyCtx<'_>, fusepath: &Path) -> PoolResult<Vec<Target>> {
        All.create(ctx, fusepath).map(pick)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EpRand;

impl Policy for EpRand {
    fn name(&self) -> &'static str {
        "eprand"
    }

    fn path_preserving(&self) -> bool {
        true
    }

    fn search(&self, ctx: &PolicyCtx<'_>, fusepath: &Path) -> PoolResult<Vec<Target>> {
        EpAll.search(ctx, fusepath).map(pick)
    }

    fn action(&self, ctx: &PolicyCtx<'_>, fusepath: &Path) -> PoolResult<Vec<Target>> {
        EpAll.action(ctx, fusepath).map(pick)
    }

    fn create(&self, ctx: &PolicyCtx<'_>, fusepath: &Path) -> PoolResult<Vec<Target>> {
        EpAll.create(ctx, fusepath).map(pick)
    }
}
