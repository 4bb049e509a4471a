/*!
 * Pool Limits and Defaults
 *
 * Centralized location for defaults and thresholds used across the pool.
 */

// =============================================================================
// BRANCH DEFAULTS
// =============================================================================

/// Default minimum free space a branch must have to receive new files (4GB)
pub const DEFAULT_MIN_FREE_SPACE: u64 = 4 * 1024 * 1024 * 1024;

// =============================================================================
// POLICY DEFAULTS
// =============================================================================

/// Default search policy name
pub const DEFAULT_SEARCH_POLICY: &str = "ff";

/// Default create policy name
pub const DEFAULT_CREATE_POLICY: &str = "epmfs";

/// Default action policy name
pub const DEFAULT_ACTION_POLICY: &str = "epall";

// =============================================================================
// READDIR
// =============================================================================

/// Default readdir worker count (0 = one thread per task)
pub const DEFAULT_READDIR_THREADS: usize = 0;

/// Initial capacity of a merged listing buffer
/// [PERF] Most directories are small; avoids early reallocations
pub const DIRENTS_INITIAL_CAPACITY: usize = 64;

/// Name of the worker threads spawned by the pool
pub const WORKER_THREAD_NAME: &str = "poolfs-worker";

// =============================================================================
// HANDLES
// =============================================================================

/// First handle id handed out (0 is reserved as "no handle")
pub const FIRST_HANDLE_ID: u64 = 1;

// =============================================================================
// TRACING
// =============================================================================

/// Operations slower than this are logged at warn level (milliseconds)
pub const SLOW_OPERATION_MS: u128 = 100;
