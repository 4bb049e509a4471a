/*!
 * Broadcast Aggregation Tests
 */

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use pretty_assertions::assert_eq;

use super::common::{Branches, FaultFs};
use poolfs::{Aggregate, Caller, Func, PoolFs};

fn setup() -> Branches {
    let branches = Branches::new(3);
    for i in 0..3 {
        branches.write(i, "/f", b"x");
        fs::set_permissions(branches.path(i, "/f"), fs::Permissions::from_mode(0o644)).unwrap();
    }
    branches
}

fn mode(branches: &Branches, index: usize) -> u32 {
    fs::metadata(branches.path(index, "/f")).unwrap().permissions().mode() & 0o777
}

#[test]
fn test_failing_first_branch_does_not_stop_the_rest() {
    for threads in [0, 3] {
        let branches = setup();
        let fs = FaultFs::new().with_failing_chmod(branches.root(0)).into_arc();
        let config = branches.config().with_broadcast_threads(threads);
        let pool = PoolFs::new(config, fs.clone()).unwrap();

        pool.chmod(Caller::current(), Path::new("/f"), 0o600).unwrap();

        let mut called = fs.calls("chmod");
        called.sort();
        let mut expected: Vec<_> = (0..3).map(|i| branches.path(i, "/f")).collect();
        expected.sort();
        assert_eq!(called, expected, "threads={}", threads);
        assert_eq!(mode(&branches, 0), 0o644);
        assert_eq!(mode(&branches, 1), 0o600);
        assert_eq!(mode(&branches, 2), 0o600);
    }
}

#[test]
fn test_all_rule_reports_first_failure() {
    let branches = setup();
    let fs = FaultFs::new().with_failing_chmod(branches.root(1)).into_arc();
    let config = branches.config().with_aggregate(Func::Chmod, Aggregate::All);
    let pool = PoolFs::new(config, fs).unwrap();

    let err = pool
        .chmod(Caller::current(), Path::new("/f"), 0o600)
        .unwrap_err();
    assert_eq!(err.errno(), libc::EIO);
    // Later branches still ran
    assert_eq!(mode(&branches, 2), 0o600);
}

#[test]
fn test_first_rule_follows_first_branch() {
    let branches = setup();
    let fs = FaultFs::new().with_failing_chmod(branches.root(0)).into_arc();
    let config = branches.config().with_aggregate(Func::Chmod, Aggregate::First);
    let pool = PoolFs::new(config, fs).unwrap();

    let err = pool
        .chmod(Caller::current(), Path::new("/f"), 0o600)
        .unwrap_err();
    assert_eq!(err.errno(), libc::EIO);
}

#[test]
fn test_any_rule_fails_only_when_every_branch_fails() {
    let branches = setup();
    let fs = FaultFs::new()
        .with_failing_chmod(branches.root(0))
        .with_failing_chmod(branches.root(1))
        .with_failing_chmod(branches.root(2))
        .into_arc();
    let pool = PoolFs::new(branches.config(), fs).unwrap();

    let err = pool
        .chmod(Caller::current(), Path::new("/f"), 0o600)
        .unwrap_err();
    assert_eq!(err.errno(), libc::EIO);
}
