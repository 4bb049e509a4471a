/*!
 * Pool Filesystem
 *
 * Operation facade the kernel-facing dispatch layer calls into. Each
 * operation loads the active snapshot once, enters the caller's
 * credentials, asks the configured policy for targets and runs the branch
 * primitives, single-target or broadcast.
 */

mod dirs;
mod files;
mod links;
mod meta;

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::branches::BranchSet;
use crate::broadcast::BroadcastDispatcher;
use crate::config::{Config, Func, SnapshotCell};
use crate::core::errors::PoolResult;
use crate::core::types::Caller;
use crate::handles::{FileHandle, FileHandles};
use crate::monitoring::{span_op, OpSpan};
use crate::policy::{PolicyCtx, ResolvedTarget, Target};
use crate::readdir::DirectoryMerger;
use crate::security::CredentialScope;
use crate::vfs::local::LocalFS;
use crate::vfs::paths;
use crate::vfs::traits::Backend;
use crate::vfs::types::SpaceInfo;

/// Configuration plus the engines built from it
///
/// Swapped as a whole on reload; an operation keeps the one it started with.
pub struct Snapshot {
    config: Config,
    merger: DirectoryMerger,
    dispatcher: BroadcastDispatcher,
}

impl Snapshot {
    fn build(config: Config, backend: &Arc<dyn Backend>) -> PoolResult<Self> {
        let merger = DirectoryMerger::new(config.readdir(), config.inodecalc(), Arc::clone(backend))?;
        let dispatcher = BroadcastDispatcher::new(config.broadcast_threads())?;
        Ok(Self {
            config,
            merger,
            dispatcher,
        })
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn branches(&self) -> &Arc<BranchSet> {
        self.config.branches()
    }

    fn select(&self, backend: &dyn Backend, func: Func, fusepath: &Path) -> PoolResult<ResolvedTarget> {
        let ctx = PolicyCtx::new(backend, self.config.branches(), self.config.min_free_space());
        self.config.policy(func).select(func.category(), &ctx, fusepath)
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("config", &self.config)
            .field("merger", &self.merger)
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

/// State of one running operation
struct Op<'a> {
    snap: &'a Snapshot,
    path: &'a Path,
    caller: Caller,
    span: &'a OpSpan,
}

/// The pooled filesystem
pub struct PoolFs {
    state: SnapshotCell<Snapshot>,
    backend: Arc<dyn Backend>,
    handles: FileHandles,
}

impl PoolFs {
    pub fn new(config: Config, backend: Arc<dyn Backend>) -> PoolResult<Self> {
        let snapshot = Snapshot::build(config, &backend)?;
        tracing::info!(
            branches = snapshot.branches().len(),
            backend = backend.name(),
            "pool ready"
        );
        Ok(Self {
            state: SnapshotCell::new(snapshot),
            backend,
            handles: FileHandles::new(),
        })
    }

    /// Pool over the host filesystem
    pub fn local(config: Config) -> PoolResult<Self> {
        Self::new(config, Arc::new(LocalFS::new()))
    }

    /// Currently published snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.state.load()
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn handles(&self) -> &FileHandles {
        &self.handles
    }

    /// Publish a new configuration
    ///
    /// Operations already running finish against the previous snapshot. On
    /// error nothing is published.
    pub fn reload(&self, config: Config) -> PoolResult<()> {
        let snapshot = Snapshot::build(config, &self.backend)?;
        let branches = snapshot.branches().len();
        let prev = self.state.swap(snapshot);
        tracing::info!(
            branches,
            previous_branches = prev.branches().len(),
            "configuration reloaded"
        );
        Ok(())
    }

    /// Branches a function would run on for `path`
    pub fn select(&self, caller: Caller, func: Func, path: &Path) -> PoolResult<ResolvedTarget> {
        self.run("select", path, caller, |op| {
            op.snap.select(self.backend.as_ref(), func, op.path)
        })
    }

    /// Space summed over the distinct devices backing the pool
    pub fn statfs(&self, caller: Caller) -> PoolResult<SpaceInfo> {
        self.run("statfs", Path::new("/"), caller, |op| {
            let mut seen = HashSet::new();
            let mut total = SpaceInfo {
                readonly: true,
                ..SpaceInfo::default()
            };
            let mut first_error = None;

            for branch in op.snap.branches().iter() {
                match self.backend.statvfs(branch.root()) {
                    Ok(space) => {
                        if seen.insert(space.dev) {
                            total.available = total.available.saturating_add(space.available);
                            total.total = total.total.saturating_add(space.total);
                            total.readonly &= space.readonly;
                        }
                    }
                    Err(e) => {
                        tracing::debug!(branch = %branch.path.display(), error = %e, "statfs skipped branch");
                        first_error.get_or_insert(e);
                    }
                }
            }

            match first_error {
                Some(e) if seen.is_empty() => Err(e),
                _ => Ok(total),
            }
        })
    }

    /// Logical path an open handle refers to
    pub fn fh_path(&self, fh: FileHandle) -> PoolResult<std::path::PathBuf> {
        Ok(self.handles.get(fh)?.fusepath.clone())
    }

    /// Run one traced operation under the caller's credentials
    fn run<T, F>(&self, name: &'static str, path: &Path, caller: Caller, f: F) -> PoolResult<T>
    where
        F: FnOnce(&Op<'_>) -> PoolResult<T>,
    {
        let path = paths::normalize(path);
        let span = span_op(name, &path, caller);
        let _entered = span.enter();
        let snap = self.state.load();

        let result = CredentialScope::enter(caller).and_then(|_scope| {
            f(&Op {
                snap: &snap,
                path: &path,
                caller,
                span: &span,
            })
        });
        span.record_result(&result);
        result
    }

    /// Run `primitive` on every target `func`'s policy picks for the
    /// operation's path and fold the results by `func`'s aggregate rule
    fn broadcast<T, F>(&self, op: &Op<'_>, func: Func, primitive: F) -> PoolResult<T>
    where
        T: Send + 'static,
        F: Fn(&dyn Backend, &Target) -> PoolResult<T> + Send + Sync + 'static,
    {
        let targets = op.snap.select(self.backend.as_ref(), func, op.path)?.into_vec();
        let backend = Arc::clone(&self.backend);
        let outcome = op
            .snap
            .dispatcher
            .dispatch(&targets, op.caller, move |target| primitive(backend.as_ref(), target));

        tracing::trace!(
            func = func.as_str(),
            targets = targets.len(),
            failed = outcome.failed(),
            "broadcast finished"
        );
        outcome.aggregate(op.snap.config.aggregate(func))
    }
}

impl std::fmt::Debug for PoolFs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolFs")
            .field("backend", &self.backend.name())
            .field("handles", &self.handles.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branches::Branch;
    use std::fs;
    use tempfile::TempDir;

    fn pool(roots: &[&TempDir]) -> PoolFs {
        let branches = roots.iter().map(|d| Branch::rw(d.path())).collect();
        let config = Config::new(BranchSet::from_branches(branches).unwrap()).with_min_free_space(0);
        PoolFs::local(config).unwrap()
    }

    #[test]
    fn test_select_normalizes_path() {
        let a = TempDir::new().unwrap();
        fs::write(a.path().join("f"), b"").unwrap();
        let pool = pool(&[&a]);

        let found = pool.select(Caller::current(), Func::Getattr, Path::new("x/../f")).unwrap();
        assert_eq!(found.first().full_path, a.path().join("f"));
    }

    #[test]
    fn test_statfs_counts_each_device_once() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        let both = pool(&[&a, &b]).statfs(Caller::current()).unwrap();
        let one = pool(&[&a]).statfs(Caller::current()).unwrap();

        // Two temp dirs share a filesystem
        assert_eq!(both.total, one.total);
    }
}
