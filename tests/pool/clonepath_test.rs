/*!
 * Path Clone Tests
 * Parent directories recreated on the branch a create lands on
 */

use std::fs;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::Path;
use std::sync::Arc;

use serial_test::serial;

use super::common::{Branches, FaultFs};
use poolfs::policy::{All, Ff};
use poolfs::{Caller, Category, PoolFs};

#[test]
fn test_create_clones_parents_from_other_branch() {
    let branches = Branches::new(2);
    branches.mkdir(1, "/a/b");
    fs::set_permissions(branches.path(1, "/a/b"), fs::Permissions::from_mode(0o750)).unwrap();

    let config = branches.config().with_policy(Category::Create, Arc::new(Ff));
    let pool = PoolFs::local(config).unwrap();
    let fh = pool
        .create(Caller::current(), Path::new("/a/b/new"), 0o644)
        .unwrap();
    pool.release(fh).unwrap();

    assert!(branches.path(0, "/a/b/new").is_file());
    let mode = fs::metadata(branches.path(0, "/a/b")).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o750);
}

#[test]
fn test_existing_parents_are_not_recreated() {
    let branches = Branches::new(2);
    branches.mkdir(0, "/a");
    branches.mkdir(1, "/a/b");
    let fs = FaultFs::new().into_arc();

    let config = branches.config().with_policy(Category::Create, Arc::new(Ff));
    let pool = PoolFs::new(config, fs.clone()).unwrap();
    let fh = pool
        .create(Caller::current(), Path::new("/a/b/new"), 0o644)
        .unwrap();
    pool.release(fh).unwrap();

    assert_eq!(fs.calls("mkdir"), vec![branches.path(0, "/a/b")]);
}

#[test]
#[serial]
fn test_clone_reproduces_owner_as_root() {
    if !nix::unistd::getuid().is_root() {
        return;
    }
    let branches = Branches::new(2);
    branches.mkdir(1, "/a/b");
    std::os::unix::fs::chown(branches.path(1, "/a"), Some(1234), Some(4321)).unwrap();
    std::os::unix::fs::chown(branches.path(1, "/a/b"), Some(1234), Some(4321)).unwrap();
    let fs = FaultFs::new().into_arc();

    let config = branches.config().with_policy(Category::Create, Arc::new(Ff));
    let pool = PoolFs::new(config, fs.clone()).unwrap();
    let caller = Caller::current();
    let fh = pool.create(caller, Path::new("/a/b/new"), 0o644).unwrap();
    pool.release(fh).unwrap();

    for dir in ["/a", "/a/b"] {
        let md = fs::metadata(branches.path(0, dir)).unwrap();
        assert_eq!((md.uid(), md.gid()), (1234, 4321), "{}", dir);
    }

    // The cloned chain is now present, so a sibling create clones nothing
    let cloned = fs.calls("mkdir").len();
    let fh = pool.create(caller, Path::new("/a/b/other"), 0o644).unwrap();
    pool.release(fh).unwrap();
    assert_eq!(fs.calls("mkdir").len(), cloned);
    assert!(branches.path(0, "/a/b/other").is_file());
}

#[test]
fn test_mkdir_on_every_branch_clones_each_parent() {
    let branches = Branches::new(3);
    branches.mkdir(2, "/p");

    let config = branches.config().with_policy(Category::Create, Arc::new(All));
    let pool = PoolFs::local(config).unwrap();
    pool.mkdir(Caller::current(), Path::new("/p/q"), 0o755).unwrap();

    for i in 0..3 {
        assert!(branches.path(i, "/p/q").is_dir(), "branch {}", i);
    }
}

#[test]
fn test_parent_missing_everywhere_is_enoent() {
    let branches = Branches::new(2);
    let config = branches.config().with_policy(Category::Create, Arc::new(Ff));
    let pool = PoolFs::local(config).unwrap();

    let err = pool
        .create(Caller::current(), Path::new("/nowhere/f"), 0o644)
        .unwrap_err();
    assert_eq!(err.errno(), libc::ENOENT);
}
