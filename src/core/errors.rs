/*!
 * Error Types
 * Centralized error handling with thiserror and miette, mapped to POSIX errno
 */

use miette::Diagnostic;
use thiserror::Error;

/// Result type for pool operations
///
/// # Must Use
/// Pool operations can fail and must be handled; the error is what the
/// kernel boundary reports back to the caller
pub type PoolResult<T> = std::result::Result<T, PoolError>;

/// Pool errors
///
/// Every variant maps onto exactly one errno value so that failures surface
/// at the syscall boundary indistinguishable from a native filesystem's.
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum PoolError {
    #[error("Not found: {0}")]
    #[diagnostic(
        code(pool::not_found),
        help("No branch satisfied the policy for this path.")
    )]
    NotFound(String),

    #[error("Permission denied: {0}")]
    #[diagnostic(
        code(pool::permission_denied),
        help("No writable branch is available, or the branch filesystem refused access.")
    )]
    PermissionDenied(String),

    #[error("Out of space: {0}")]
    #[diagnostic(
        code(pool::out_of_space),
        help("Every candidate branch is below its minimum free space.")
    )]
    OutOfSpace(String),

    #[error("Out of memory: {0}")]
    #[diagnostic(code(pool::out_of_memory))]
    OutOfMemory(String),

    #[error("Cross-device link: {0}")]
    #[diagnostic(
        code(pool::cross_device),
        help("Configure `link-exdev` to substitute a symlink for cross-branch hard links.")
    )]
    CrossDevice(String),

    #[error("Bad file handle: {0}")]
    #[diagnostic(code(pool::bad_handle))]
    BadHandle(u64),

    #[error("Invalid argument: {0}")]
    #[diagnostic(code(pool::invalid_argument))]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(pool::invalid_config),
        help("Review the pool configuration file.")
    )]
    InvalidConfig(String),

    #[error("Not implemented: {0}")]
    #[diagnostic(code(pool::not_implemented))]
    NotImplemented(String),

    #[error("{context}: {message} (errno {errno})")]
    #[diagnostic(code(pool::io))]
    Io {
        context: String,
        message: String,
        errno: i32,
    },
}

impl PoolError {
    /// Wrap an I/O error, keeping its raw OS error code
    pub fn io(err: std::io::Error, context: impl Into<String>) -> Self {
        PoolError::Io {
            context: context.into(),
            message: err.to_string(),
            errno: err.raw_os_error().unwrap_or(libc::EIO),
        }
    }

    /// Wrap a nix errno
    pub fn sys(err: nix::errno::Errno, context: impl Into<String>) -> Self {
        PoolError::Io {
            context: context.into(),
            message: err.desc().to_string(),
            errno: err as i32,
        }
    }

    /// POSIX errno for this error (positive)
    pub fn errno(&self) -> i32 {
        match self {
            PoolError::NotFound(_) => libc::ENOENT,
            PoolError::PermissionDenied(_) => libc::EACCES,
            PoolError::OutOfSpace(_) => libc::ENOSPC,
            PoolError::OutOfMemory(_) => libc::ENOMEM,
            PoolError::CrossDevice(_) => libc::EXDEV,
            PoolError::BadHandle(_) => libc::EBADF,
            PoolError::InvalidArgument(_) | PoolError::InvalidConfig(_) => libc::EINVAL,
            PoolError::NotImplemented(_) => libc::ENOSYS,
            PoolError::Io { errno, .. } => *errno,
        }
    }

    /// Negated errno as reported through the kernel operation table
    #[inline]
    pub fn to_negated(&self) -> i32 {
        -self.errno()
    }

    /// Whether this error means "does not exist on that branch"
    #[inline]
    pub fn is_not_found(&self) -> bool {
        self.errno() == libc::ENOENT
    }
}

impl From<std::io::Error> for PoolError {
    fn from(err: std::io::Error) -> Self {
        PoolError::io(err, "i/o")
    }
}
