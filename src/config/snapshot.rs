/*!
 * Configuration Snapshots
 * Lock-free publication of the active configuration
 */

use arc_swap::ArcSwap;
use std::sync::Arc;

use super::Config;

/// Holder of the active configuration (or of state derived from it)
///
/// # Performance
///
/// - **Reads**: one atomic pointer load, no lock
/// - **Writes**: whole-snapshot swap
///
/// An operation loads the snapshot once and works against it to the end, so
/// a reload in the middle of it is never observed half-applied.
pub struct SnapshotCell<T = Config> {
    inner: ArcSwap<T>,
}

impl<T> SnapshotCell<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: ArcSwap::from_pointee(value),
        }
    }

    /// Current snapshot
    #[inline(always)]
    pub fn load(&self) -> Arc<T> {
        self.inner.load_full()
    }

    /// Publish a new snapshot, returning the previous one
    pub fn swap(&self, value: T) -> Arc<T> {
        self.inner.swap(Arc::new(value))
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for SnapshotCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SnapshotCell").field(&self.load()).finish()
    }
}
