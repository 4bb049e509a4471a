/*!
 * Sequential Listing
 * Open and read each branch in turn on the calling thread
 */

use std::path::Path;

use super::merge::Merge;
use super::Opened;
use crate::branches::BranchSet;
use crate::core::errors::PoolResult;
use crate::vfs::paths;
use crate::vfs::traits::Backend;

pub(super) fn merge_readdir(
    backend: &dyn Backend,
    branches: &BranchSet,
    dirname: &Path,
    merge: &mut Merge<'_>,
) -> PoolResult<()> {
    let mut opened = Opened::default();

    for branch in branches {
        let path = paths::branch_path(&branch.path, dirname);
        match backend.open_dir(&path) {
            Ok(stream) => {
                opened.succeeded();
                let dev = stream.dev();
                merge.add_branch(stream, dev)?;
            }
            Err(e) => opened.failed(e),
        }
    }
    opened.finish()
}
