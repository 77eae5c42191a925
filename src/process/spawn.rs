/*!
 * Thread Spawning
 *
 * Starts an OS thread under a freshly allocated pid. The thread body's
 * return value becomes the exit status; a panicking body exits with
 * `PANIC_EXIT_STATUS`. If the thread cannot be created the pid is
 * rolled back with `unalloc`.
 */

use super::lifecycle::PidManager;
use crate::core::errors::PidError;
use crate::core::types::{ExitStatus, Pid};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread;
use thiserror::Error;
use tracing::{debug, warn};

/// Exit status recorded for a thread whose body panicked
pub const PANIC_EXIT_STATUS: ExitStatus = 101;

#[derive(Error, Debug)]
pub enum SpawnError {
    #[error("Pid allocation failed: {0}")]
    Pid(#[from] PidError),

    #[error("Thread creation failed: {0}")]
    Thread(#[from] std::io::Error),
}

/// Run `body` on a new thread owned by a child pid of `parent`
///
/// The child exits with auto-detach, so its own children are never left
/// waiting on a parent that is gone.
pub fn spawn<F>(manager: &PidManager, parent: Pid, name: &str, body: F) -> Result<Pid, SpawnError>
where
    F: FnOnce(Pid) -> ExitStatus + Send + 'static,
{
    let pid = manager.alloc(parent)?;
    let child_manager = manager.clone();

    let spawned = thread::Builder::new()
        .name(format!("{name}-{pid}"))
        .spawn(move || {
            let status = catch_unwind(AssertUnwindSafe(|| body(pid))).unwrap_or_else(|_| {
                warn!(pid, "Process body panicked");
                PANIC_EXIT_STATUS
            });
            child_manager.exit(pid, status, true);
        });

    match spawned {
        Ok(_) => {
            debug!(pid, parent, name, "Process thread started");
            Ok(pid)
        }
        Err(e) => {
            warn!(pid, parent, error = %e, "Thread creation failed, releasing pid");
            manager.unalloc(parent, pid);
            Err(SpawnError::Thread(e))
        }
    }
}
