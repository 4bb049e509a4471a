/*!
 * Newest Policy
 * Branch whose copy of the path has the latest modification time
 */

use std::path::Path;
use std::time::SystemTime;

use super::predicates::{self, PolicyCtx, Scan};
use super::{Policy, Target};
use crate::core::errors::PoolResult;
use crate::vfs::paths;

fn newest<I>(candidates: I) -> Vec<Target>
where
    I: IntoIterator<Item = (Target, SystemTime)>,
{
    let mut best: Option<(Target, SystemTime)> = None;
    for (target, mtime) in candidates {
        let better = match &best {
            Some((_, best_mtime)) => mtime > *best_mtime,
            None => true,
        };
        if better {
            best = Some((target, mtime));
        }
    }
    best.map(|(target, _)| vec![target]).unwrap_or_default()
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Newest;

impl Policy for Newest {
    fn name(&self) -> &'static str {
        "newest"
    }

    fn path_preserving(&self) -> bool {
        true
    }

    fn search(&self, ctx: &PolicyCtx<'_>, fusepath: &Path) -> PoolResult<Vec<Target>> {
        let found = predicates::search(ctx, fusepath, Scan::All)?;
        Ok(newest(found.into_iter().map(|f| (f.target, f.attr.mtime))))
    }

    fn action(&self, ctx: &PolicyCtx<'_>, fusepath: &Path) -> PoolResult<Vec<Target>> {
        let found = predicates::action(ctx, fusepath, Scan::All)?;
        Ok(newest(found.into_iter().map(|f| (f.target, f.attr.mtime))))
    }

    /// Judged by the parent directory, which must exist
    fn create(&self, ctx: &PolicyCtx<'_>, fusepath: &Path) -> PoolResult<Vec<Target>> {
        let parent = paths::parent(fusepath);
        let writable = predicates::create(ctx, fusepath, true, Scan::All)?;
        let dated = writable.into_iter().filter_map(|w| {
            ctx.backend
                .lstat(&paths::branch_path(w.target.root(), parent))
                .ok()
                .map(|attr| (w.target, attr.mtime))
        });
        Ok(newest(dated))
    }
}
