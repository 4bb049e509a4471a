/*!
 * PoolFS Library
 * Union filesystem core: branch policies, merged directory listings and
 * broadcast operations over a pool of directories
 */

pub mod branches;
pub mod broadcast;
pub mod config;
pub mod core;
pub mod handles;
pub mod link;
pub mod monitoring;
pub mod policy;
pub mod pool;
pub mod readdir;
pub mod security;
pub mod vfs;
pub mod workers;

// Re-exports
pub use branches::{Branch, BranchMode, BranchSet};
pub use broadcast::{Aggregate, BroadcastDispatcher, BroadcastOutcome};
pub use config::{Config, ConfigError, Func, SnapshotCell};
pub use crate::core::errors::{PoolError, PoolResult};
pub use crate::core::types::Caller;
pub use handles::FileHandle;
pub use link::LinkExdev;
pub use monitoring::{init_tracing, OpSpan};
pub use policy::{Category, Policy, PolicyRegistry, ResolvedTarget, Target};
pub use pool::{PoolFs, Snapshot};
pub use readdir::{DirEntries, DirectoryMerger, ReadDirMode};
pub use security::CredentialScope;
pub use vfs::{Attr, Backend, DirEntry, InodeCalc, LocalFS, SpaceInfo};
pub use workers::ThreadPool;
