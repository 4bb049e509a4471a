/*!
 * Concurrent Open and Read
 * Each worker lists a whole branch; the merge still runs in branch order
 */

use std::path::Path;
use std::sync::Arc;

use super::merge::Merge;
use super::Opened;
use crate::branches::BranchSet;
use crate::core::errors::PoolResult;
use crate::core::types::{Caller, DevId};
use crate::security::CredentialScope;
use crate::vfs::paths;
use crate::vfs::traits::Backend;
use crate::vfs::types::BranchEntry;
use crate::workers::ThreadPool;

type Listing = (DevId, Vec<PoolResult<BranchEntry>>);

pub(super) fn merge_readdir(
    pool: &ThreadPool,
    backend: &Arc<dyn Backend>,
    branches: &BranchSet,
    dirname: &Path,
    caller: Caller,
    merge: &mut Merge<'_>,
) -> PoolResult<()> {
    let handles: Vec<_> = branches
        .iter()
        .map(|branch| {
            let backend = Arc::clone(backend);
            let path = paths::branch_path(&branch.path, dirname);
            pool.submit(move || -> PoolResult<Listing> {
                let _scope = CredentialScope::enter(caller)?;
                let stream = backend.open_dir(&path)?;
                let dev = stream.dev();
                Ok((dev, stream.collect()))
            })
        })
        .collect();

    let mut opened = Opened::default();
    for handle in handles {
        match handle.wait().and_then(|r| r) {
            Ok((dev, entries)) => {
                opened.succeeded();
                merge.add_branch(entries, dev)?;
            }
            Err(e) => opened.failed(e),
        }
    }
    opened.finish()
}
