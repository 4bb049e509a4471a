/*!
 * Broadcast Dispatch
 *
 * Runs one primitive against every target a policy returned and folds the
 * per-branch results into one answer according to an aggregation rule.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::core::errors::{PoolError, PoolResult};
use crate::core::limits::WORKER_THREAD_NAME;
use crate::core::types::Caller;
use crate::policy::Target;
use crate::security::CredentialScope;
use crate::workers::ThreadPool;

/// How per-branch results combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    /// Success if any target succeeded, otherwise the first error
    #[default]
    Any,
    /// Success only if every target succeeded, otherwise the first error
    All,
    /// The first target decides
    First,
}

impl Aggregate {
    pub const fn as_str(self) -> &'static str {
        match self {
            Aggregate::Any => "any",
            Aggregate::All => "all",
            Aggregate::First => "first",
        }
    }
}

impl FromStr for Aggregate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" => Ok(Aggregate::Any),
            "all" => Ok(Aggregate::All),
            "first" => Ok(Aggregate::First),
            other => Err(format!("unknown aggregate rule: {}", other)),
        }
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of the primitive on one target
#[derive(Debug)]
pub struct BranchResult<T> {
    pub target: Target,
    pub result: PoolResult<T>,
}

/// Per-target results, in branch order
#[derive(Debug)]
pub struct BroadcastOutcome<T> {
    results: Vec<BranchResult<T>>,
}

impl<T> BroadcastOutcome<T> {
    pub fn results(&self) -> &[BranchResult<T>] {
        &self.results
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    /// Fold into one result
    ///
    /// The value kept is the first successful one in branch order.
    pub fn aggregate(self, rule: Aggregate) -> PoolResult<T> {
        let mut results = self.results.into_iter().map(|r| r.result);

        match rule {
            Aggregate::First => results
                .next()
                .unwrap_or_else(|| Err(PoolError::NotFound("no targets".to_string()))),
            Aggregate::Any => {
                let mut first_error = None;
                for result in results {
                    match result {
                        Ok(value) => return Ok(value),
                        Err(e) => {
                            first_error.get_or_insert(e);
                        }
                    }
                }
                Err(first_error.unwrap_or_else(|| PoolError::NotFound("no targets".to_string())))
            }
            Aggregate::All => {
                let mut first_value = None;
                for result in results {
                    match result {
                        Ok(value) => {
                            first_value.get_or_insert(value);
                        }
                        Err(e) => return Err(e),
                    }
                }
                first_value.ok_or_else(|| PoolError::NotFound("no targets".to_string()))
            }
        }
    }
}

/// Fans a primitive out over targets
///
/// Without a pool the primitive runs on the calling thread, which is
/// expected to already hold the caller's credentials. With a pool every
/// task enters its own [`CredentialScope`]. Either way results come back in
/// target order and every target is attempted regardless of earlier
/// failures.
pub struct BroadcastDispatcher {
    pool: Option<ThreadPool>,
}

impl BroadcastDispatcher {
    /// Run on the calling thread
    pub fn sequential() -> Self {
        Self { pool: None }
    }

    /// Run through a pool of `threads` workers; `0` runs on the calling thread
    pub fn new(threads: usize) -> PoolResult<Self> {
        if threads == 0 {
            return Ok(Self::sequential());
        }
        let pool = ThreadPool::with_name(threads, &format!("{}-broadcast", WORKER_THREAD_NAME))?;
        Ok(Self { pool: Some(pool) })
    }

    pub fn dispatch<T, F>(&self, targets: &[Target], caller: Caller, primitive: F) -> BroadcastOutcome<T>
    where
        T: Send + 'static,
        F: Fn(&Target) -> PoolResult<T> + Send + Sync + 'static,
    {
        let results = match &self.pool {
            None => targets
                .iter()
                .map(|target| BranchResult {
                    target: target.clone(),
                    result: primitive(target),
                })
                .collect(),
            Some(pool) => {
                let primitive = Arc::new(primitive);
                let handles: Vec<_> = targets
                    .iter()
                    .map(|target| {
                        let primitive = Arc::clone(&primitive);
                        let task_target = target.clone();
                        let handle = pool.submit(move || {
                            let _scope = CredentialScope::enter(caller)?;
                            primitive(&task_target)
                        });
                        (target.clone(), handle)
                    })
                    .collect();

                handles
                    .into_iter()
                    .map(|(target, handle)| BranchResult {
                        target,
                        result: handle.wait().and_then(|r| r),
                    })
                    .collect()
            }
        };

        let outcome = BroadcastOutcome { results };
        for failed in outcome.results.iter().filter(|r| r.result.is_err()) {
            if let Err(e) = &failed.result {
                tracing::debug!(branch = %failed.target.root().display(), error = %e, "broadcast target failed");
            }
        }
        outcome
    }
}

impl fmt::Debug for BroadcastDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BroadcastDispatcher")
            .field("pool", &self.pool)
            .finish()
    }
}
