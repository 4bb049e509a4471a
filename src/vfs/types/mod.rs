/*!
 * VFS Types
 * Shared types for branch filesystem operations
 */

mod entry;
mod file_type;
mod metadata;

pub use entry::{BranchEntry, DirEntry};
pub use file_type::FileType;
pub use metadata::{Attr, SpaceInfo};
