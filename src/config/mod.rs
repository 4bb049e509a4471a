/*!
 * Pool Configuration
 *
 * A TOML file is deserialized into a raw mirror, then validated into a typed
 * [`Config`] with every policy name already resolved. A published `Config`
 * is immutable; reloading publishes a new one through [`SnapshotCell`].
 */

mod error;
mod func;
mod raw;
mod snapshot;

pub use error::ConfigError;
pub use func::Func;
pub use snapshot::SnapshotCell;

use ahash::RandomState;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::branches::{parse_size, Branch, BranchGroup, BranchSet};
use crate::broadcast::Aggregate;
use crate::core::limits::{
    DEFAULT_ACTION_POLICY, DEFAULT_CREATE_POLICY, DEFAULT_MIN_FREE_SPACE, DEFAULT_SEARCH_POLICY,
};
use crate::link::LinkExdev;
use crate::policy::{Category, EpAll, Ff, Policy, PolicyRegistry, SpacePolicy};
use crate::readdir::ReadDirMode;
use crate::vfs::inode::InodeCalc;
use raw::{RawConfig, RawGroup, RawSize};

/// Validated pool configuration
#[derive(Debug, Clone)]
pub struct Config {
    mountpoint: Option<PathBuf>,
    branches: Arc<BranchSet>,
    min_free_space: u64,
    link_exdev: LinkExdev,
    inodecalc: InodeCalc,
    readdir: ReadDirMode,
    broadcast_threads: usize,
    category_policies: CategoryPolicies,
    func_policies: HashMap<Func, Arc<dyn Policy>, RandomState>,
    aggregates: HashMap<Func, Aggregate, RandomState>,
}

impl Config {
    /// Defaults around the given branches
    pub fn new(branches: BranchSet) -> Self {
        let category_policies = CategoryPolicies {
            search: Arc::new(Ff),
            action: Arc::new(EpAll),
            create: Arc::new(SpacePolicy::epmfs()),
        };

        let builtins = PolicyRegistry::with_builtins();
        let func_policies = Func::ALL
            .iter()
            .filter_map(|&func| Some((func, builtins.get(func.default_policy()?)?)))
            .collect();

        Self {
            mountpoint: None,
            branches: Arc::new(branches),
            min_free_space: DEFAULT_MIN_FREE_SPACE,
            link_exdev: LinkExdev::default(),
            inodecalc: InodeCalc::default(),
            readdir: ReadDirMode::default(),
            broadcast_threads: 0,
            category_policies,
            func_policies,
            aggregates: HashMap::with_hasher(RandomState::new()),
        }
    }

    /// Parse and validate a TOML document against the built-in policies
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Self::from_toml_str_with(s, &PolicyRegistry::with_builtins())
    }

    /// Parse and validate a TOML document, resolving policies in `registry`
    pub fn from_toml_str_with(s: &str, registry: &PolicyRegistry) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(s)?;
        Self::from_raw(raw, registry)
    }

    /// Read and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(
            path = %path.display(),
            branches = config.branches.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    fn from_raw(raw: RawConfig, registry: &PolicyRegistry) -> Result<Self, ConfigError> {
        let mut config = Config::new(parse_branches(raw.branches)?);
        config.mountpoint = raw.mountpoint;

        if let Some(size) = raw.min_free_space {
            config.min_free_space = match size {
                RawSize::Bytes(bytes) => bytes,
                RawSize::Text(text) => {
                    parse_size(&text).map_err(|e| ConfigError::value("min-free-space", &text, e.to_string()))?
                }
            };
        }
        if let Some(value) = raw.link_exdev {
            config.link_exdev = value
                .parse()
                .map_err(|reason: String| ConfigError::value("link-exdev", &value, reason))?;
        }
        if let Some(value) = raw.inodecalc {
            config.inodecalc = value
                .parse()
                .map_err(|reason: String| ConfigError::value("inodecalc", &value, reason))?;
        }
        if let Some(value) = raw.readdir {
            config.readdir = value
                .parse()
                .map_err(|reason: String| ConfigError::value("readdir", &value, reason))?;
        }
        if let Some(threads) = raw.broadcast_threads {
            config.broadcast_threads = threads;
        }

        let categories = [
            (Category::Search, raw.policy.search, DEFAULT_SEARCH_POLICY),
            (Category::Action, raw.policy.action, DEFAULT_ACTION_POLICY),
            (Category::Create, raw.policy.create, DEFAULT_CREATE_POLICY),
        ];
        for (category, name, default) in categories {
            let name = name.unwrap_or_else(|| default.to_string());
            let key = format!("policy.{}", category);
            *config.category_policies.get_mut(category) = resolve(registry, &key, &name)?;
        }

        for (key, name) in &raw.func {
            let func: Func = key
                .parse()
                .map_err(|reason: String| ConfigError::value("func", key, reason))?;
            let policy = resolve(registry, &format!("func.{}", func), name)?;
            config.func_policies.insert(func, policy);
        }

        for (key, value) in &raw.aggregate {
            let func: Func = key
                .parse()
                .map_err(|reason: String| ConfigError::value("aggregate", key, reason))?;
            if !func.is_broadcast() {
                return Err(ConfigError::value("aggregate", key, "not a broadcast function"));
            }
            let rule: Aggregate = value
                .parse()
                .map_err(|reason: String| ConfigError::value(&format!("aggregate.{}", func), value, reason))?;
            config.aggregates.insert(func, rule);
        }

        Ok(config)
    }

    pub fn with_mountpoint(mut self, mountpoint: impl Into<PathBuf>) -> Self {
        self.mountpoint = Some(mountpoint.into());
        self
    }

    pub fn with_min_free_space(mut self, bytes: u64) -> Self {
        self.min_free_space = bytes;
        self
    }

    pub fn with_link_exdev(mut self, strategy: LinkExdev) -> Self {
        self.link_exdev = strategy;
        self
    }

    pub fn with_inodecalc(mut self, inodecalc: InodeCalc) -> Self {
        self.inodecalc = inodecalc;
        self
    }

    pub fn with_readdir(mut self, mode: ReadDirMode) -> Self {
        self.readdir = mode;
        self
    }

    pub fn with_broadcast_threads(mut self, threads: usize) -> Self {
        self.broadcast_threads = threads;
        self
    }

    /// Category-wide policy
    pub fn with_policy(mut self, category: Category, policy: Arc<dyn Policy>) -> Self {
        *self.category_policies.get_mut(category) = policy;
        self
    }

    /// Policy for one function, overriding its category
    pub fn with_func_policy(mut self, func: Func, policy: Arc<dyn Policy>) -> Self {
        self.func_policies.insert(func, policy);
        self
    }

    pub fn with_aggregate(mut self, func: Func, rule: Aggregate) -> Self {
        self.aggregates.insert(func, rule);
        self
    }

    #[inline]
    pub fn mountpoint(&self) -> Option<&Path> {
        self.mountpoint.as_deref()
    }

    #[inline]
    pub fn branches(&self) -> &Arc<BranchSet> {
        &self.branches
    }

    #[inline]
    pub fn min_free_space(&self) -> u64 {
        self.min_free_space
    }

    #[inline]
    pub fn link_exdev(&self) -> LinkExdev {
        self.link_exdev
    }

    #[inline]
    pub fn inodecalc(&self) -> InodeCalc {
        self.inodecalc
    }

    #[inline]
    pub fn readdir(&self) -> ReadDirMode {
        self.readdir
    }

    #[inline]
    pub fn broadcast_threads(&self) -> usize {
        self.broadcast_threads
    }

    /// Policy for a function: its own override, else its category's
    pub fn policy(&self, func: Func) -> &Arc<dyn Policy> {
        self.func_policies
            .get(&func)
            .unwrap_or_else(|| self.category_policy(func.category()))
    }

    pub fn category_policy(&self, category: Category) -> &Arc<dyn Policy> {
        match category {
            Category::Search => &self.category_policies.search,
            Category::Action => &self.category_policies.action,
            Category::Create => &self.category_policies.create,
        }
    }

    pub fn aggregate(&self, func: Func) -> Aggregate {
        self.aggregates.get(&func).copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
struct CategoryPolicies {
    search: Arc<dyn Policy>,
    action: Arc<dyn Policy>,
    create: Arc<dyn Policy>,
}

impl CategoryPolicies {
    fn get_mut(&mut self, category: Category) -> &mut Arc<dyn Policy> {
        match category {
            Category::Search => &mut self.search,
            Category::Action => &mut self.action,
            Category::Create => &mut self.create,
        }
    }
}

fn resolve(registry: &PolicyRegistry, key: &str, name: &str) -> Result<Arc<dyn Policy>, ConfigError> {
    registry.get(name.trim()).ok_or_else(|| ConfigError::UnknownPolicy {
        key: key.to_string(),
        name: name.to_string(),
    })
}

fn parse_branch(spec: &str) -> Result<Branch, ConfigError> {
    Branch::parse(spec).map_err(|e| ConfigError::InvalidBranch {
        spec: spec.to_string(),
        reason: e.to_string(),
    })
}

fn parse_branches(raw: Vec<RawGroup>) -> Result<BranchSet, ConfigError> {
    if raw.is_empty() {
        return Err(ConfigError::EmptyBranches);
    }

    let mut groups = Vec::with_capacity(raw.len());
    for group in raw {
        let group = match group {
            RawGroup::One(spec) => BranchGroup::single(parse_branch(&spec)?),
            RawGroup::Many(specs) => {
                let branches = specs
                    .iter()
                    .map(|spec| parse_branch(spec))
                    .collect::<Result<Vec<_>, _>>()?;
                BranchGroup::new(branches).map_err(|_| ConfigError::EmptyBranches)?
            }
        };
        groups.push(group);
    }
    BranchSet::new(groups).map_err(|_| ConfigError::EmptyBranches)
}
