/*!
 * Branch Selection Policies
 *
 * A policy maps a logical path to the branch(es) an operation runs on.
 * Every policy answers three categories: search (where does the path live),
 * action (which copies does a metadata change touch) and create (where does
 * a new path go).
 */

mod all;
mod ff;
mod newest;
mod predicates;
mod random;
mod registry;
mod space;

pub use all::{All, EpAll};
pub use ff::{EpFf, Ff};
pub use newest::Newest;
pub use predicates::PolicyCtx;
pub use random::{EpRand, Rand};
pub use registry::PolicyRegistry;
pub use space::SpacePolicy;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use crate::branches::Branch;
use crate::core::errors::{PoolError, PoolResult};
use crate::vfs::paths;

/// Policy category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Search,
    Action,
    Create,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Search, Category::Action, Category::Create];

    pub const fn as_str(self) -> &'static str {
        match self {
            Category::Search => "search",
            Category::Action => "action",
            Category::Create => "create",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "search" => Ok(Category::Search),
            "action" => Ok(Category::Action),
            "create" => Ok(Category::Create),
            other => Err(format!("unknown policy category: {}", other)),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A branch chosen for an operation, with the full branch path of the
/// logical path on it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub branch: Arc<Branch>,
    pub full_path: PathBuf,
}

impl Target {
    pub fn new(branch: &Arc<Branch>, fusepath: &Path) -> Self {
        Self {
            full_path: paths::branch_path(branch.root(), fusepath),
            branch: Arc::clone(branch),
        }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        self.branch.root()
    }
}

/// Result of a selection: never empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTarget {
    One(Target),
    Many(Vec<Target>),
}

impl ResolvedTarget {
    /// Wrap a policy's result; an empty result is `NotFound`
    pub fn from_targets(mut targets: Vec<Target>, fusepath: &Path) -> PoolResult<Self> {
        match targets.len() {
            0 => Err(PoolError::NotFound(format!(
                "no branch for {}",
                fusepath.display()
            ))),
            1 => Ok(ResolvedTarget::One(targets.remove(0))),
            _ => Ok(ResolvedTarget::Many(targets)),
        }
    }

    /// First target in branch order
    pub fn first(&self) -> &Target {
        match self {
            ResolvedTarget::One(target) => target,
            ResolvedTarget::Many(targets) => &targets[0],
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ResolvedTarget::One(_) => 1,
            ResolvedTarget::Many(targets) => targets.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Target> {
        match self {
            ResolvedTarget::One(target) => std::slice::from_ref(target).iter(),
            ResolvedTarget::Many(targets) => targets.iter(),
        }
    }

    pub fn into_vec(self) -> Vec<Target> {
        match self {
            ResolvedTarget::One(target) => vec![target],
            ResolvedTarget::Many(targets) => targets,
        }
    }
}

impl<'a> IntoIterator for &'a ResolvedTarget {
    type Item = &'a Target;
    type IntoIter = std::slice::Iter<'a, Target>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Branch selection policy
///
/// Implementations are stateless and shared between threads. The category
/// methods return targets in branch order; an empty `Ok` is never returned,
/// "nothing eligible" is an error.
pub trait Policy: Send + Sync {
    /// Registered name
    fn name(&self) -> &'static str;

    /// Branches the path exists on
    fn search(&self, _ctx: &PolicyCtx<'_>, fusepath: &Path) -> PoolResult<Vec<Target>> {
        Err(unimplemented(self.name(), Category::Search, fusepath))
    }

    /// Branches a metadata change applies to
    fn action(&self, _ctx: &PolicyCtx<'_>, fusepath: &Path) -> PoolResult<Vec<Target>> {
        Err(unimplemented(self.name(), Category::Action, fusepath))
    }

    /// Branches a new path is created on
    fn create(&self, _ctx: &PolicyCtx<'_>, fusepath: &Path) -> PoolResult<Vec<Target>> {
        Err(unimplemented(self.name(), Category::Create, fusepath))
    }

    /// Whether create only picks branches where the parent already exists
    fn path_preserving(&self) -> bool {
        false
    }

    /// Dispatch on category
    fn select(
        &self,
        category: Category,
        ctx: &PolicyCtx<'_>,
        fusepath: &Path,
    ) -> PoolResult<ResolvedTarget> {
        let targets = match category {
            Category::Search => self.search(ctx, fusepath)?,
            Category::Action => self.action(ctx, fusepath)?,
            Category::Create => self.create(ctx, fusepath)?,
        };
        ResolvedTarget::from_targets(targets, fusepath)
    }
}

fn unimplemented(name: &str, category: Category, fusepath: &Path) -> PoolError {
    PoolError::NotImplemented(format!(
        "policy {} has no {} rule ({})",
        name,
        category,
        fusepath.display()
    ))
}

impl fmt::Debug for dyn Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Policy({})", self.name())
    }
}
