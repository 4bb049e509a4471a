/*!
 * Concurrent Open, Sequential Read
 *
 * Open latency (network branches especially) dominates a listing and is
 * independent per branch, so only the opens are fanned out. Reading stays on
 * the calling thread, in branch order.
 */

use std::path::Path;
use std::sync::Arc;

use super::merge::Merge;
use super::Opened;
use crate::branches::BranchSet;
use crate::core::errors::PoolResult;
use crate::core::types::Caller;
use crate::security::CredentialScope;
use crate::vfs::paths;
use crate::vfs::traits::{Backend, DirStream};
use crate::workers::{TaskHandle, ThreadPool};

type OpenHandle = TaskHandle<PoolResult<Box<dyn DirStream>>>;

/// Phase 1: one open task per branch, in branch order
fn opendir(
    pool: &ThreadPool,
    backend: &Arc<dyn Backend>,
    branches: &BranchSet,
    dirname: &Path,
    caller: Caller,
) -> Vec<OpenHandle> {
    branches
        .iter()
        .map(|branch| {
            let backend = Arc::clone(backend);
            let path = paths::branch_path(&branch.path, dirname);
            pool.submit(move || {
                let _scope = CredentialScope::enter(caller)?;
                backend.open_dir(&path)
            })
        })
        .collect()
}

/// Phase 2: drain in submission order
fn readdir(handles: Vec<OpenHandle>, merge: &mut Merge<'_>) -> PoolResult<()> {
    let mut opened = Opened::default();
    let mut handles = handles.into_iter();

    while let Some(handle) = handles.next() {
        let stream = match handle.wait().and_then(|r| r) {
            Ok(stream) => stream,
            Err(e) => {
                opened.failed(e);
                continue;
            }
        };

        opened.succeeded();
        let dev = stream.dev();
        if let Err(e) = merge.add_branch(stream, dev) {
            // Close whatever the remaining tasks opened before bailing
            for rest in handles {
                drop(rest.wait());
            }
            return Err(e);
        }
    }

    opened.finish()
}

pub(super) fn merge_readdir(
    pool: &ThreadPool,
    backend: &Arc<dyn Backend>,
    branches: &BranchSet,
    dirname: &Path,
    caller: Caller,
    merge: &mut Merge<'_>,
) -> PoolResult<()> {
    let handles = opendir(pool, backend, branches, dirname, caller);
    readdir(handles, merge)
}
