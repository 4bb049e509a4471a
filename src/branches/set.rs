/*!
 * Branch Set
 * Ordered groups of branches; the view every policy operates over
 */

use std::path::Path;
use std::sync::Arc;

use super::branch::Branch;
use crate::core::errors::{PoolError, PoolResult};

/// Branches treated as equivalent alternatives at one priority tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchGroup {
    branches: Vec<Arc<Branch>>,
}

impl BranchGroup {
    pub fn new(branches: Vec<Branch>) -> PoolResult<Self> {
        if branches.is_empty() {
            return Err(PoolError::InvalidConfig("branch group cannot be empty".into()));
        }
        Ok(Self {
            branches: branches.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn single(branch: Branch) -> Self {
        Self {
            branches: vec![Arc::new(branch)],
        }
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Branch>> {
        self.branches.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }
}

/// Ordered sequence of branch groups
///
/// Order is significant: it decides which branch is "first" for first-found
/// policies and which branch shadows the others in merged listings.
/// Iteration is groups in order, branches within a group in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchSet {
    groups: Vec<BranchGroup>,
}

impl BranchSet {
    /// Build a branch set; an empty set is rejected
    pub fn new(groups: Vec<BranchGroup>) -> PoolResult<Self> {
        if groups.is_empty() {
            return Err(PoolError::InvalidConfig("branch set cannot be empty".into()));
        }
        Ok(Self { groups })
    }

    /// One group per branch
    pub fn from_branches(branches: Vec<Branch>) -> PoolResult<Self> {
        Self::new(branches.into_iter().map(BranchGroup::single).collect())
    }

    #[inline]
    pub fn groups(&self) -> &[BranchGroup] {
        &self.groups
    }

    /// Every branch, flattened in priority order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Branch>> {
        self.groups.iter().flat_map(BranchGroup::iter)
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(BranchGroup::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find the branch with the given root
    pub fn find(&self, root: &Path) -> Option<&Arc<Branch>> {
        self.iter().find(|b| b.path == root)
    }
}

impl<'a> IntoIterator for &'a BranchSet {
    type Item = &'a Arc<Branch>;
    type IntoIter = Box<dyn Iterator<Item = &'a Arc<Branch>> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
