/*!
 * Logical Paths
 * Helpers mapping pool-relative paths onto branch paths
 */

use std::path::{Component, Path, PathBuf};

/// Normalize a logical path: absolute, no `.`/`..`, no trailing slash
///
/// `..` never escapes the pool root.
pub fn normalize(fusepath: &Path) -> PathBuf {
    let rooted = Path::new("/").join(fusepath);
    path_clean::clean(rooted)
}

/// Join a branch root and a logical path
pub fn branch_path(root: &Path, fusepath: &Path) -> PathBuf {
    match fusepath.strip_prefix("/") {
        Ok(rel) if rel.as_os_str().is_empty() => root.to_path_buf(),
        Ok(rel) => root.join(rel),
        Err(_) => root.join(fusepath),
    }
}

/// Logical parent directory; the root is its own parent
pub fn parent(fusepath: &Path) -> &Path {
    fusepath.parent().unwrap_or_else(|| Path::new("/"))
}

/// Relative path from directory `from_dir` to `to`, both logical
///
/// `relative(/a/b, /a/c/f)` is `../c/f`.
pub fn relative(from_dir: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component> = from_dir.components().collect();
    let target: Vec<Component> = to.components().collect();
    let common = from
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..from.len() {
        out.push("..");
    }
    for component in &target[common..] {
        out.push(component.as_os_str());
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Logical prefixes of a path's parent chain, shallowest first
///
/// `parent_chain(/a/b/c)` yields `/a`, `/a/b`.
pub fn parent_chain(fusepath: &Path) -> Vec<PathBuf> {
    let mut chain: Vec<PathBuf> = parent(fusepath)
        .ancestors()
        .filter(|p| *p != Path::new("/") && !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .collect();
    chain.reverse();
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("a/b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/../../x")), PathBuf::from("/x"));
        assert_eq!(normalize(Path::new("/")), PathBuf::from("/"));
    }

    #[test]
    fn test_branch_path() {
        let root = Path::new("/mnt/disk1");
        assert_eq!(branch_path(root, Path::new("/")), PathBuf::from("/mnt/disk1"));
        assert_eq!(
            branch_path(root, Path::new("/a/b")),
            PathBuf::from("/mnt/disk1/a/b")
        );
    }

    #[test]
    fn test_relative() {
        assert_eq!(
            relative(Path::new("/a/b"), Path::new("/a/c/f")),
            PathBuf::from("../c/f")
        );
        assert_eq!(relative(Path::new("/"), Path::new("/f")), PathBuf::from("f"));
        assert_eq!(
            relative(Path::new("/x/y"), Path::new("/x/y/z")),
            PathBuf::from("z")
        );
    }

    #[test]
    fn test_parent_chain() {
        assert_eq!(
            parent_chain(Path::new("/a/b/c")),
            vec![PathBuf::from("/a"), PathBuf::from("/a/b")]
        );
        assert!(parent_chain(Path::new("/f")).is_empty());
    }
}
