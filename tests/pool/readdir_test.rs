/*!
 * Merged Readdir Tests
 */

use std::collections::HashSet;
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;

use super::common::{Branches, FaultFs};
use poolfs::{Caller, DirEntries, FileHandle, InodeCalc, PoolFs, ReadDirMode};

fn list(pool: &PoolFs, path: &str) -> DirEntries {
    let caller = Caller::current();
    let fh: FileHandle = pool.opendir(caller, Path::new(path)).unwrap();
    let mut buf = DirEntries::new();
    pool.readdir(caller, fh, &mut buf).unwrap();
    pool.releasedir(fh).unwrap();
    buf
}

fn names(buf: &DirEntries) -> Vec<String> {
    buf.iter()
        .map(|e| e.name().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_names_unique_across_branches() {
    let branches = Branches::new(3);
    branches.write(0, "/d/a", b"");
    branches.write(1, "/d/a", b"");
    branches.write(1, "/d/b", b"");
    branches.write(2, "/d/c", b"");
    branches.mkdir(2, "/d/b");

    for mode in [
        ReadDirMode::Seq,
        ReadDirMode::Cosr { threads: 2 },
        ReadDirMode::Cor { threads: 0 },
    ] {
        let pool = PoolFs::local(branches.config().with_readdir(mode)).unwrap();
        let buf = list(&pool, "/d");

        let mut got = names(&buf);
        let unique: HashSet<_> = got.iter().cloned().collect();
        assert_eq!(unique.len(), got.len(), "duplicates with {}", mode);
        got.sort();
        assert_eq!(got, vec![".", "..", "a", "b", "c"], "mode {}", mode);

        // First branch in order wins: /d/b is a file on branch 1
        assert!(!buf.get("b").unwrap().is_dir());
    }
}

#[test]
fn test_dot_entries_come_from_first_branch() {
    let branches = Branches::new(2);
    branches.write(0, "/d/a", b"");
    branches.mkdir(1, "/d");
    let config = branches.config().with_inodecalc(InodeCalc::Passthrough);
    let pool = PoolFs::local(config).unwrap();
    let buf = list(&pool, "/d");

    assert_eq!(names(&buf), vec![".", "..", "a"]);
    let own = std::fs::metadata(branches.path(0, "/d")).unwrap().ino();
    let parent = std::fs::metadata(branches.root(0)).unwrap().ino();
    assert_eq!(buf.get(".").unwrap().ino, own);
    assert_eq!(buf.get("..").unwrap().ino, parent);
    assert!(buf.get(".").unwrap().is_dir());
}

#[test]
fn test_entries_follow_branch_order() {
    let branches = Branches::new(2);
    let first = ["f00", "f01", "f02", "f03", "f04", "f05"];
    let second = ["g00", "g01", "g02", "g03", "g04", "g05"];
    for name in first {
        branches.write(0, &format!("/d/{}", name), b"");
    }
    for name in second {
        branches.write(1, &format!("/d/{}", name), b"");
    }

    for mode in [
        ReadDirMode::Seq,
        ReadDirMode::Cosr { threads: 2 },
        ReadDirMode::Cor { threads: 2 },
    ] {
        let pool = PoolFs::local(branches.config().with_readdir(mode)).unwrap();
        let got = names(&list(&pool, "/d"));
        let last_first = got.iter().rposition(|n| n.starts_with('f')).unwrap();
        let first_second = got.iter().position(|n| n.starts_with('g')).unwrap();
        assert!(last_first < first_second, "{}: {:?}", mode, got);

        // Within a branch, entries keep that branch's enumeration order
        let enumerated: Vec<String> = std::fs::read_dir(branches.path(1, "/d"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        let merged: Vec<String> = got.iter().filter(|n| n.starts_with('g')).cloned().collect();
        assert_eq!(merged, enumerated, "{}", mode);
    }
}

#[test]
fn test_listing_inode_matches_getattr() {
    let branches = Branches::new(2);
    branches.write(1, "/d/f", b"data");
    branches.mkdir(0, "/d/sub");
    let pool = PoolFs::local(branches.config()).unwrap();
    let buf = list(&pool, "/d");
    assert_eq!(list(&pool, "/d").as_slice(), buf.as_slice());

    for name in ["f", "sub"] {
        let attr = pool
            .getattr(Caller::current(), &Path::new("/d").join(name))
            .unwrap();
        assert_eq!(buf.get(name).unwrap().ino, attr.ino, "{}", name);
    }
}

#[test]
fn test_branch_opens_run_concurrently() {
    let branches = Branches::new(4);
    let delay = Duration::from_millis(150);
    let mut fs = FaultFs::new();
    for i in 0..4 {
        branches.write(i, &format!("/d/f{}", i), b"");
        fs = fs.with_dir_delay(branches.root(i), delay);
    }
    let config = branches.config().with_readdir(ReadDirMode::Cosr { threads: 4 });
    let pool = PoolFs::new(config, fs.into_arc()).unwrap();

    let start = Instant::now();
    let buf = list(&pool, "/d");
    let elapsed = start.elapsed();

    assert_eq!(buf.len(), 6);
    // Serial opens would take 4x the delay
    assert!(elapsed < delay * 3, "readdir took {:?}", elapsed);
}

#[test]
fn test_missing_on_some_branches_is_tolerated() {
    let branches = Branches::new(3);
    branches.write(2, "/only/f", b"");
    let pool = PoolFs::local(branches.config()).unwrap();

    assert_eq!(names(&list(&pool, "/only")), vec![".", "..", "f"]);
}

#[test]
fn test_capped_buffer_is_enomem() {
    let branches = Branches::new(2);
    for i in 0..8 {
        branches.write(i % 2, &format!("/d/f{}", i), b"");
    }
    let pool = PoolFs::local(branches.config()).unwrap();
    let caller = Caller::current();

    let fh = pool.opendir(caller, Path::new("/d")).unwrap();
    let mut buf = DirEntries::with_max_entries(3);
    let err = pool.readdir(caller, fh, &mut buf).unwrap_err();
    assert_eq!(err.errno(), libc::ENOMEM);
    pool.releasedir(fh).unwrap();
}
