/*!
 * Policy Selection Tests
 * Branch choice through the pool facade
 */

use std::path::Path;
use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;

use super::common::Branches;
use poolfs::policy::{Ff, Rand};
use poolfs::{Branch, BranchSet, Caller, Category, Config, Func, PoolFs};

#[test]
fn test_ff_search_prefers_earlier_branch() {
    let branches = Branches::new(3);
    branches.write(1, "/f", b"one");
    branches.write(2, "/f", b"two");
    let pool = PoolFs::local(branches.config()).unwrap();

    let found = pool.select(Caller::current(), Func::Getattr, Path::new("/f")).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found.first().full_path, branches.path(1, "/f"));
}

#[test]
fn test_ff_is_deterministic_under_concurrency() {
    let branches = Branches::new(4);
    for i in 1..4 {
        branches.write(i, "/shared/f", b"x");
    }
    let pool = Arc::new(PoolFs::local(branches.config()).unwrap());
    let expected = branches.path(1, "/shared/f");

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                (0..200)
                    .map(|_| {
                        pool.select(Caller::current(), Func::Open, Path::new("/shared/f"))
                            .unwrap()
                            .first()
                            .full_path
                            .clone()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for worker in workers {
        for picked in worker.join().unwrap() {
            assert_eq!(picked, expected);
        }
    }
}

#[test]
fn test_epmfs_create_preserves_path() {
    let branches = Branches::new(3);
    branches.mkdir(2, "/only-here");
    let pool = PoolFs::local(branches.config()).unwrap();

    let picked = pool
        .select(Caller::current(), Func::Create, Path::new("/only-here/new"))
        .unwrap();
    assert_eq!(picked.first().root(), branches.root(2));
}

#[test]
fn test_create_on_readonly_branches_is_eacces() {
    let branches = Branches::new(2);
    let set = BranchSet::from_branches(vec![
        Branch::ro(branches.root(0)),
        Branch::ro(branches.root(1)),
    ])
    .unwrap();
    let config = Config::new(set)
        .with_min_free_space(0)
        .with_policy(Category::Create, Arc::new(Ff));
    let pool = PoolFs::local(config).unwrap();

    let err = pool
        .select(Caller::current(), Func::Create, Path::new("/f"))
        .unwrap_err();
    assert_eq!(err.errno(), libc::EACCES);
}

#[test]
fn test_create_without_space_is_enospc() {
    let branches = Branches::new(2);
    let config = Config::new(branches.set())
        .with_min_free_space(u64::MAX)
        .with_policy(Category::Create, Arc::new(Ff));
    let pool = PoolFs::local(config).unwrap();

    let err = pool
        .select(Caller::current(), Func::Create, Path::new("/f"))
        .unwrap_err();
    assert_eq!(err.errno(), libc::ENOSPC);
}

#[test]
fn test_func_override_beats_category() {
    let branches = Branches::new(3);
    for i in 0..3 {
        branches.write(i, "/f", b"x");
    }
    let config = branches.config().with_func_policy(Func::Getattr, Arc::new(Rand));
    let pool = PoolFs::local(config).unwrap();

    let roots: Vec<_> = (0..3).map(|i| branches.root(i).to_path_buf()).collect();
    for _ in 0..50 {
        let picked = pool.select(Caller::current(), Func::Getattr, Path::new("/f")).unwrap();
        assert_eq!(picked.len(), 1);
        assert!(roots.iter().any(|r| r == picked.first().root()));
    }
}

#[test]
fn test_search_missing_everywhere_is_enoent() {
    let branches = Branches::new(2);
    let pool = PoolFs::local(branches.config()).unwrap();

    let err = pool
        .select(Caller::current(), Func::Getattr, Path::new("/missing"))
        .unwrap_err();
    assert_eq!(err.errno(), libc::ENOENT);
}

#[test]
fn test_policies_from_toml() {
    let branches = Branches::new(2);
    branches.write(0, "/f", b"x");
    branches.write(1, "/f", b"x");
    let toml = format!(
        r#"
branches = ["{}", "{}"]
min-free-space = 0

[policy]
action = "epall"

[func]
unlink = "ff"
"#,
        branches.root(0).display(),
        branches.root(1).display()
    );
    let pool = PoolFs::local(Config::from_toml_str(&toml).unwrap()).unwrap();

    let chmod = pool.select(Caller::current(), Func::Chmod, Path::new("/f")).unwrap();
    let unlink = pool.select(Caller::current(), Func::Unlink, Path::new("/f")).unwrap();
    assert_eq!(chmod.len(), 2);
    assert_eq!(unlink.len(), 1);
}
