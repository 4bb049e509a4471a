/*!
 * Configuration Reload Tests
 */

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use pretty_assertions::assert_eq;

use super::common::{Branches, FaultFs};
use poolfs::{Branch, BranchSet, Caller, Config, DirEntries, PoolFs};

fn single(root: &Path) -> Config {
    Config::new(BranchSet::from_branches(vec![Branch::rw(root)]).unwrap()).with_min_free_space(0)
}

#[test]
fn test_in_flight_readdir_keeps_its_snapshot() {
    let branches = Branches::new(2);
    branches.write(0, "/d/old", b"");
    branches.write(1, "/d/new", b"");

    let fs = FaultFs::new()
        .with_dir_delay(branches.root(0), Duration::from_millis(200))
        .into_arc();
    let pool = PoolFs::new(single(branches.root(0)), fs.clone()).unwrap();
    let caller = Caller::current();
    let fh = pool.opendir(caller, Path::new("/d")).unwrap();

    let listed = thread::scope(|s| {
        let reader = s.spawn(|| {
            let mut buf = DirEntries::new();
            pool.readdir(caller, fh, &mut buf).map(|_| buf)
        });

        // Wait until the reader is inside the old branch
        while fs.calls("open_dir").is_empty() {
            thread::sleep(Duration::from_millis(5));
        }
        pool.reload(single(branches.root(1))).unwrap();

        reader.join().unwrap().unwrap()
    });
    pool.releasedir(fh).unwrap();

    assert!(listed.get("old").is_some());
    assert!(listed.get("new").is_none());

    // Operations started after the reload see the new branch set
    let fh = pool.opendir(caller, Path::new("/d")).unwrap();
    let mut buf = DirEntries::new();
    pool.readdir(caller, fh, &mut buf).unwrap();
    pool.releasedir(fh).unwrap();
    assert!(buf.get("new").is_some());
    assert!(buf.get("old").is_none());
}

#[test]
fn test_held_snapshot_outlives_reload() {
    let branches = Branches::new(2);
    let pool = PoolFs::local(single(branches.root(0))).unwrap();

    let held = pool.snapshot();
    pool.reload(single(branches.root(1))).unwrap();

    assert!(held.branches().find(branches.root(0)).is_some());
    let current = pool.snapshot();
    assert!(!Arc::ptr_eq(&held, &current));
    assert!(current.branches().find(branches.root(1)).is_some());
}

#[test]
fn test_reload_from_file() {
    let branches = Branches::new(2);
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("pool.toml");
    std::fs::write(
        &path,
        format!(
            "branches = [\"{}=RW\", \"{}=NC\"]\nreaddir = \"seq\"\n",
            branches.root(0).display(),
            branches.root(1).display()
        ),
    )
    .unwrap();

    let pool = PoolFs::local(single(branches.root(0))).unwrap();
    pool.reload(Config::load(&path).unwrap()).unwrap();

    let snapshot = pool.snapshot();
    assert_eq!(snapshot.branches().len(), 2);
    assert_eq!(snapshot.config().readdir(), poolfs::ReadDirMode::Seq);
}
