/*!
 * Directory Merging
 *
 * Builds one logical listing out of the same directory on every branch.
 * Names are deduplicated first-branch-wins and every entry gets a synthetic
 * inode from the configured [`InodeCalc`].
 */

mod buffer;
mod cor;
mod cosr;
mod merge;
mod seq;

pub use buffer::DirEntries;

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use crate::branches::BranchSet;
use crate::core::errors::{PoolError, PoolResult};
use crate::core::limits::{DEFAULT_READDIR_THREADS, WORKER_THREAD_NAME};
use crate::core::types::Caller;
use crate::vfs::inode::InodeCalc;
use crate::vfs::traits::Backend;
use crate::workers::ThreadPool;
use merge::Merge;

/// How branch directories are opened and read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadDirMode {
    /// Open and read one branch at a time on the calling thread
    Seq,
    /// Concurrent open, sequential read
    Cosr { threads: usize },
    /// Concurrent open and read
    Cor { threads: usize },
}

impl ReadDirMode {
    /// Worker count for the concurrent modes; 0 is one thread per task
    pub fn threads(self) -> Option<usize> {
        match self {
            ReadDirMode::Seq => None,
            ReadDirMode::Cosr { threads } | ReadDirMode::Cor { threads } => Some(threads),
        }
    }
}

impl Default for ReadDirMode {
    fn default() -> Self {
        ReadDirMode::Cosr {
            threads: DEFAULT_READDIR_THREADS,
        }
    }
}

impl FromStr for ReadDirMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, threads) = match s.split_once(':') {
            Some((name, n)) => {
                let n = n
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| format!("invalid readdir thread count: {}", n))?;
                (name.trim(), Some(n))
            }
            None => (s.trim(), None),
        };
        let threads = threads.unwrap_or(DEFAULT_READDIR_THREADS);

        match name {
            "seq" if threads == DEFAULT_READDIR_THREADS => Ok(ReadDirMode::Seq),
            "seq" => Err("readdir mode seq takes no thread count".to_string()),
            "cosr" => Ok(ReadDirMode::Cosr { threads }),
            "cor" => Ok(ReadDirMode::Cor { threads }),
            other => Err(format!("unknown readdir mode: {}", other)),
        }
    }
}

impl fmt::Display for ReadDirMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReadDirMode::Seq => write!(f, "seq"),
            ReadDirMode::Cosr { threads } => write!(f, "cosr:{}", threads),
            ReadDirMode::Cor { threads } => write!(f, "cor:{}", threads),
        }
    }
}

/// Open bookkeeping shared by the strategies
///
/// A listing succeeds if at least one branch directory opened; otherwise the
/// first branch's error is the result.
#[derive(Default)]
struct Opened {
    count: usize,
    first_error: Option<PoolError>,
}

impl Opened {
    fn succeeded(&mut self) {
        self.count += 1;
    }

    fn failed(&mut self, err: PoolError) {
        tracing::trace!(error = %err, "branch directory skipped");
        self.first_error.get_or_insert(err);
    }

    fn finish(self) -> PoolResult<()> {
        if self.count > 0 {
            return Ok(());
        }
        Err(self
            .first_error
            .unwrap_or_else(|| PoolError::NotFound("no branches".to_string())))
    }
}

/// Multi-branch directory lister
///
/// Owns the worker pool used by the concurrent modes. One merger serves any
/// number of callers; each call only borrows the pool.
pub struct DirectoryMerger {
    mode: ReadDirMode,
    pool: Option<ThreadPool>,
    backend: Arc<dyn Backend>,
    inodecalc: InodeCalc,
}

impl DirectoryMerger {
    pub fn new(mode: ReadDirMode, inodecalc: InodeCalc, backend: Arc<dyn Backend>) -> PoolResult<Self> {
        let pool = match mode.threads() {
            Some(threads) => Some(ThreadPool::with_name(
                threads,
                &format!("{}-readdir", WORKER_THREAD_NAME),
            )?),
            None => None,
        };

        Ok(Self {
            mode,
            pool,
            backend,
            inodecalc,
        })
    }

    pub fn mode(&self) -> ReadDirMode {
        self.mode
    }

    pub fn inodecalc(&self) -> InodeCalc {
        self.inodecalc
    }

    /// Fill `buf` with the merged listing of `dirname`
    ///
    /// `buf` is reset first. Branch directories are opened with the caller's
    /// credentials. On `OutOfMemory` the listing is abandoned; `buf` holds
    /// whatever was accepted before the failure.
    pub fn merge_readdir(
        &self,
        branches: &BranchSet,
        dirname: &Path,
        caller: Caller,
        buf: &mut DirEntries,
    ) -> PoolResult<()> {
        let mut merge = Merge::new(dirname, self.inodecalc, buf);

        match (&self.mode, &self.pool) {
            (ReadDirMode::Cosr { .. }, Some(pool)) => {
                cosr::merge_readdir(pool, &self.backend, branches, dirname, caller, &mut merge)
            }
            (ReadDirMode::Cor { .. }, Some(pool)) => {
                cor::merge_readdir(pool, &self.backend, branches, dirname, caller, &mut merge)
            }
            _ => seq::merge_readdir(self.backend.as_ref(), branches, dirname, &mut merge),
        }
    }
}

impl fmt::Debug for DirectoryMerger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryMerger")
            .field("mode", &self.mode)
            .field("inodecalc", &self.inodecalc)
            .field("backend", &self.backend.name())
            .finish()
    }
}
