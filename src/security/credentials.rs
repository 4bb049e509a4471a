/*!
 * Credential Scope
 *
 * RAII impersonation of the calling user around branch syscalls.
 *
 * Effective ids are switched with raw per-thread syscalls: the libc
 * wrappers broadcast id changes to every thread of the process, which would
 * leak one caller's identity into concurrent requests.
 */

use std::cell::Cell;
use std::marker::PhantomData;

use crate::core::errors::{PoolError, PoolResult};
use crate::core::types::{Caller, Gid, Uid};

#[cfg(any(target_arch = "x86", target_arch = "arm"))]
const SYS_SETRESUID: libc::c_long = libc::SYS_setresuid32;
#[cfg(any(target_arch = "x86", target_arch = "arm"))]
const SYS_SETRESGID: libc::c_long = libc::SYS_setresgid32;
#[cfg(not(any(target_arch = "x86", target_arch = "arm")))]
const SYS_SETRESUID: libc::c_long = libc::SYS_setresuid;
#[cfg(not(any(target_arch = "x86", target_arch = "arm")))]
const SYS_SETRESGID: libc::c_long = libc::SYS_setresgid;

const UNCHANGED: libc::c_uint = libc::c_uint::MAX;

thread_local! {
    /// Effective ids of this thread, cached to skip redundant syscalls
    static CURRENT: Cell<Option<(Uid, Gid)>> = const { Cell::new(None) };
}

fn current_ids() -> (Uid, Gid) {
    CURRENT.with(|cell| match cell.get() {
        Some(ids) => ids,
        None => {
            let ids = (
                nix::unistd::geteuid().as_raw(),
                nix::unistd::getegid().as_raw(),
            );
            cell.set(Some(ids));
            ids
        }
    })
}

fn set_thread_euid(uid: Uid) -> PoolResult<()> {
    // SAFETY: setresuid takes three integer ids and touches no memory; the
    // raw syscall only changes the calling thread's credentials.
    let rv = unsafe { libc::syscall(SYS_SETRESUID, UNCHANGED, uid as libc::c_uint, UNCHANGED) };
    if rv != 0 {
        return Err(PoolError::sys(nix::errno::Errno::last(), format!("seteuid {}", uid)));
    }
    CURRENT.with(|cell| {
        let (_, gid) = cell.get().unwrap_or_else(current_ids);
        cell.set(Some((uid, gid)));
    });
    Ok(())
}

fn set_thread_egid(gid: Gid) -> PoolResult<()> {
    // SAFETY: as above, integer arguments only, calling thread only.
    let rv = unsafe { libc::syscall(SYS_SETRESGID, UNCHANGED, gid as libc::c_uint, UNCHANGED) };
    if rv != 0 {
        return Err(PoolError::sys(nix::errno::Errno::last(), format!("setegid {}", gid)));
    }
    CURRENT.with(|cell| {
        let (uid, _) = cell.get().unwrap_or_else(current_ids);
        cell.set(Some((uid, gid)));
    });
    Ok(())
}

/// Switch this thread's effective ids to `(uid, gid)`
///
/// Changing the group requires root, so a non-root euid is first raised
/// back to 0 (possible while the saved uid is root).
fn switch_to(uid: Uid, gid: Gid) -> PoolResult<()> {
    let (cur_uid, cur_gid) = current_ids();
    if cur_uid == uid && cur_gid == gid {
        return Ok(());
    }

    if cur_uid != 0 {
        set_thread_euid(0)?;
    }
    if cur_gid != gid {
        set_thread_egid(gid)?;
    }
    // TODO: load the caller's supplementary groups with a per-thread
    // setgroups(2) backed by a uid -> groups cache.
    if uid != 0 {
        set_thread_euid(uid)?;
    }
    Ok(())
}

/// Scoped impersonation guard
///
/// For its lifetime, filesystem syscalls made by the owning thread run as
/// the given user and group. The previous ids are restored on drop,
/// whichever way the scope is left. Scopes are neither `Send` nor `Sync`:
/// each thread impersonating a caller holds its own.
///
/// # Example
///
/// ```ignore
/// let _scope = CredentialScope::enter(caller)?;
/// backend.mkdir(&path, 0o755)?; // owned by the caller
/// ```
#[must_use = "credentials are restored as soon as the scope is dropped"]
pub struct CredentialScope {
    prev: (Uid, Gid),
    _not_send: PhantomData<*const ()>,
}

impl CredentialScope {
    /// Impersonate `caller` on the current thread
    pub fn enter(caller: Caller) -> PoolResult<Self> {
        let prev = current_ids();
        switch_to(caller.uid, caller.gid)?;
        tracing::trace!(uid = caller.uid, gid = caller.gid, "credentials entered");
        Ok(Self {
            prev,
            _not_send: PhantomData,
        })
    }

    /// Run as root on the current thread
    pub fn root() -> PoolResult<Self> {
        Self::enter(Caller::root())
    }

    /// Effective identity of the current thread
    pub fn current() -> Caller {
        let (uid, gid) = current_ids();
        Caller::new(uid, gid)
    }
}

impl Drop for CredentialScope {
    fn drop(&mut self) {
        let (uid, gid) = self.prev;
        if let Err(e) = switch_to(uid, gid) {
            tracing::error!(uid, gid, error = %e, "failed to restore credentials");
        }
    }
}
