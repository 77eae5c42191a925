/*!
 * Process Syscalls
 * waitpid and detach entry points over the pid manager
 *
 * Both return a non-negative value on success and a negated errno on
 * failure, the convention of the syscall dispatch layer.
 */

use crate::core::errors::{Errno, PidError};
use crate::core::types::{ExitStatus, JoinFlags, Pid};
use crate::monitoring::SyscallSpan;
use crate::process::PidManager;
use tracing::debug;

#[inline]
fn to_retval(err: PidError) -> i32 {
    -err.errno().code()
}

/// Wait for a child of `caller` and collect its exit status
///
/// Only the parent may wait; anything else is `EINVAL`. Returns the
/// child's pid, or 0 when `flags` carries `NO_HANG` and it is still running.
pub fn sys_waitpid(
    manager: &PidManager,
    caller: Pid,
    pid: Pid,
    status: Option<&mut ExitStatus>,
    flags: u32,
) -> i32 {
    let span = SyscallSpan::new("waitpid", caller);
    let _entered = span.enter();
    if !manager.is_child(caller, pid) {
        debug!(caller, pid, "waitpid on non-child");
        return span.record_return(-Errno::Einval.code());
    }

    let retval = match manager.join(caller, pid, status, JoinFlags::from_bits(flags)) {
        Ok(joined) => joined as i32,
        Err(e) => to_retval(e),
    };
    span.record_return(retval)
}

/// Detach a child of `caller`
pub fn sys_detach(manager: &PidManager, caller: Pid, pid: Pid) -> i32 {
    let span = SyscallSpan::new("detach", caller);
    let _entered = span.enter();
    let retval = match manager.detach(caller, pid) {
        Ok(()) => 0,
        Err(e) => {
            debug!(caller, pid, error = %e, "detach rejected");
            to_retval(e)
        }
    };
    span.record_return(retval)
}
