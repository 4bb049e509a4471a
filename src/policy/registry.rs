/*!
 * Policy Registry
 * Name to policy lookup, consulted when configuration is loaded
 */

use ahash::RandomState;
use std::collections::HashMap;
use std::sync::Arc;

use super::{All, EpAll, EpFf, EpRand, Ff, Newest, Policy, Rand, SpacePolicy};
use crate::core::errors::{PoolError, PoolResult};

/// Registry of named policies
///
/// Cheap to clone; registration is builder-style and returns a new registry.
#[derive(Clone)]
pub struct PolicyRegistry {
    policies: Arc<HashMap<&'static str, Arc<dyn Policy>, RandomState>>,
}

impl PolicyRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            policies: Arc::new(HashMap::with_hasher(RandomState::new())),
        }
    }

    /// Registry holding every built-in policy
    pub fn with_builtins() -> Self {
        Self::new()
            .register(Arc::new(Ff))
            .register(Arc::new(EpFf))
            .register(Arc::new(All))
            .register(Arc::new(EpAll))
            .register(Arc::new(SpacePolicy::mfs()))
            .register(Arc::new(SpacePolicy::lfs()))
            .register(Arc::new(SpacePolicy::epmfs()))
            .register(Arc::new(SpacePolicy::eplfs()))
            .register(Arc::new(Rand))
            .register(Arc::new(EpRand))
            .register(Arc::new(Newest))
    }

    /// Register a policy under its own name, replacing any previous one
    pub fn register(mut self, policy: Arc<dyn Policy>) -> Self {
        Arc::make_mut(&mut self.policies).insert(policy.name(), policy);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Policy>> {
        self.policies.get(name).cloned()
    }

    /// Look up a policy, failing with a configuration error
    pub fn resolve(&self, name: &str) -> PoolResult<Arc<dyn Policy>> {
        self.get(name.trim())
            .ok_or_else(|| PoolError::InvalidConfig(format!("unknown policy: {}", name)))
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.policies.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for PolicyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyRegistry")
            .field("policies", &self.names())
            .finish()
    }
}
