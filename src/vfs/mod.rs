/*!
 * Virtual File System Module
 * Branch filesystem primitives and path/inode helpers
 */

pub mod clonepath;
pub mod inode;
pub mod local;
pub mod paths;
pub mod traits;
pub mod types;

// Re-exports
pub use clonepath::{clone_path, clone_path_as_root};
pub use inode::InodeCalc;
pub use local::LocalFS;
pub use traits::{Backend, DirStream};
pub use types::{Attr, BranchEntry, DirEntry, FileType, SpaceInfo};
