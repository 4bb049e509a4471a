/*!
 * Cross-Device Link Tests
 */

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;

use super::common::{Branches, FaultFs};
use poolfs::{Caller, LinkExdev, PoolFs};

fn exdev_pool(branches: &Branches, strategy: LinkExdev) -> PoolFs {
    let config = branches
        .config()
        .with_link_exdev(strategy)
        .with_mountpoint("/mnt/pool");
    PoolFs::new(config, FaultFs::new().with_link_exdev().into_arc()).unwrap()
}

#[test]
fn test_passthrough_returns_exdev() {
    let branches = Branches::new(2);
    branches.write(0, "/a/f", b"x");

    let err = exdev_pool(&branches, LinkExdev::Passthrough)
        .link(Caller::current(), Path::new("/a/f"), Path::new("/a/g"))
        .unwrap_err();
    assert_eq!(err.errno(), libc::EXDEV);
    assert!(fs::symlink_metadata(branches.path(0, "/a/g")).is_err());
}

#[test]
fn test_rel_symlink_points_back_at_source() {
    let branches = Branches::new(2);
    branches.write(0, "/a/b/f", b"x");
    branches.mkdir(0, "/a/c");

    let pool = exdev_pool(&branches, LinkExdev::RelSymlink);
    pool.link(Caller::current(), Path::new("/a/b/f"), Path::new("/a/c/g"))
        .unwrap();

    let link = branches.path(0, "/a/c/g");
    assert_eq!(fs::read_link(&link).unwrap(), Path::new("../b/f"));
    assert_eq!(fs::read(&link).unwrap(), b"x");
}

#[test]
fn test_abs_base_symlink_targets_branch_copy() {
    let branches = Branches::new(2);
    branches.write(1, "/f", b"x");

    let pool = exdev_pool(&branches, LinkExdev::AbsBaseSymlink);
    pool.link(Caller::current(), Path::new("/f"), Path::new("/g"))
        .unwrap();

    // Default symlink policy is ff, so the link lands on the first branch
    assert_eq!(
        fs::read_link(branches.path(0, "/g")).unwrap(),
        branches.path(1, "/f")
    );
}

#[test]
fn test_abs_pool_symlink_targets_mountpoint() {
    let branches = Branches::new(1);
    branches.write(0, "/f", b"x");

    let pool = exdev_pool(&branches, LinkExdev::AbsPoolSymlink);
    pool.link(Caller::current(), Path::new("/f"), Path::new("/g"))
        .unwrap();
    assert_eq!(
        fs::read_link(branches.path(0, "/g")).unwrap(),
        Path::new("/mnt/pool/f")
    );
}

#[test]
fn test_abs_pool_symlink_without_mountpoint_is_einval() {
    let branches = Branches::new(1);
    branches.write(0, "/f", b"x");
    let config = branches.config().with_link_exdev(LinkExdev::AbsPoolSymlink);
    let pool = PoolFs::new(config, FaultFs::new().with_link_exdev().into_arc()).unwrap();

    let err = pool
        .link(Caller::current(), Path::new("/f"), Path::new("/g"))
        .unwrap_err();
    assert_eq!(err.errno(), libc::EINVAL);
}
