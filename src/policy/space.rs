/*!
 * Free Space Policies
 * mfs, lfs and their existing-path variants
 */

use std::path::Path;

use super::ff::Ff;
use super::predicates::{self, PolicyCtx, Scan};
use super::{Policy, Target};
use crate::core::errors::PoolResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prefer {
    Most,
    Least,
}

impl Prefer {
    /// Whether `candidate` beats `best`; ties keep the earlier branch
    fn beats(self, candidate: u64, best: u64) -> bool {
        match self {
            Prefer::Most => candidate > best,
            Prefer::Least => candidate < best,
        }
    }
}

/// Branch with the most (or least) available space
#[derive(Debug, Clone, Copy)]
pub struct SpacePolicy {
    name: &'static str,
    prefer: Prefer,
    existing_parent: bool,
}

impl SpacePolicy {
    pub const fn mfs() -> Self {
        Self {
            name: "mfs",
            prefer: Prefer::Most,
            existing_parent: false,
        }
    }

    pub const fn lfs() -> Self {
        Self {
            name: "lfs",
            prefer: Prefer::Least,
            existing_parent: false,
        }
    }

    pub const fn epmfs() -> Self {
        Self {
            name: "epmfs",
            prefer: Prefer::Most,
            existing_parent: true,
        }
    }

    pub const fn eplfs() -> Self {
        Self {
            name: "eplfs",
            prefer: Prefer::Least,
            existing_parent: true,
        }
    }

    fn best<I>(&self, candidates: I) -> Vec<Target>
    where
        I: IntoIterator<Item = (Target, u64)>,
    {
        let mut best: Option<(Target, u64)> = None;
        for (target, available) in candidates {
            let better = match &best {
                Some((_, best_available)) => self.prefer.beats(available, *best_available),
                None => true,
            };
            if better {
                best = Some((target, available));
            }
        }
        best.map(|(target, _)| vec![target]).unwrap_or_default()
    }
}

impl Policy for SpacePolicy {
    fn name(&self) -> &'static str {
        self.name
    }

    fn path_preserving(&self) -> bool {
        self.existing_parent
    }

    fn search(&self, ctx: &PolicyCtx<'_>, fusepath: &Path) -> PoolResult<Vec<Target>> {
        Ff.search(ctx, fusepath)
    }

    fn action(&self, ctx: &PolicyCtx<'_>, fusepath: &Path) -> PoolResult<Vec<Target>> {
        let found = predicates::action(ctx, fusepath, Scan::All)?;
        let sized = found.into_iter().filter_map(|f| {
            ctx.backend
                .statvfs(f.target.root())
                .ok()
                .map(|space| (f.target, space.available))
        });
        Ok(self.best(sized))
    }

    fn create(&self, ctx: &PolicyCtx<'_>, fusepath: &Path) -> PoolResult<Vec<Target>> {
        let writable = predicates::create(ctx, fusepath, self.existing_parent, Scan::All)?;
        Ok(self.best(writable.into_iter().map(|w| (w.target, w.space.available))))
    }
}
