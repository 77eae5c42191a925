/*!
 * Process Lifecycle
 *
 * Allocation, exit and reaping of process identifiers.
 *
 * # Locking
 *
 * A single table mutex guards every slot and every record field,
 * joiner counts included. Each record carries its own condition variable,
 * always waited on with the table mutex, and `exit` broadcasts it.
 *
 * # Reclamation
 *
 * A record is freed by exactly one party: whichever step observes it
 * exited, parentless and without joiners. Joiners hold a counted
 * reference; the last one out is told to reap through
 * [`Reap::Now`](super::record::Reap::Now).
 */

use super::builder::PidManagerBuilder;
use super::record::PidRecord;
use super::table::{PidStats, PidTable};
use crate::core::config::PidConfig;
use crate::core::errors::{InvalidReason, PidError, PidResult};
use crate::core::types::{is_reserved, ExitStatus, JoinFlags, Pid, INVALID_PID};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Process identity and exit-lifecycle manager
///
/// Cheap to clone; clones share the same table.
#[derive(Debug, Clone)]
pub struct PidManager {
    table: Arc<Mutex<PidTable>>,
    config: PidConfig,
}

impl PidManager {
    /// Bootstrap a manager with the default limits
    pub fn bootstrap() -> Self {
        Self::with_config(PidConfig::default())
    }

    pub fn builder() -> PidManagerBuilder {
        PidManagerBuilder::new()
    }

    /// Bootstrap with an already validated configuration
    pub(crate) fn with_config(config: PidConfig) -> Self {
        let table = PidTable::bootstrap(&config);
        info!(
            capacity = config.procs_max,
            pid_min = config.pid_min,
            pid_max = config.pid_max,
            "Pid table bootstrapped"
        );
        Self {
            table: Arc::new(Mutex::new(table)),
            config,
        }
    }

    /// Allocate a fresh identifier whose parent is `caller`
    pub fn alloc(&self, caller: Pid) -> PidResult<Pid> {
        let mut table = self.table.lock();

        let pid = match table.find_free() {
            Ok(pid) => pid,
            Err(e) => {
                warn!(caller, allocated = table.allocated(), "Pid allocation failed: table full");
                return Err(e);
            }
        };

        if let Err(e) = table.adopt(caller, pid) {
            warn!(caller, error = %e, "Pid allocation failed");
            return Err(e);
        }
        table.insert(pid, PidRecord::new(pid, caller));
        table.advance_cursor();

        debug!(pid, parent = caller, allocated = table.allocated(), "Pid allocated");
        Ok(pid)
    }

    /// Roll back an allocation whose thread never started
    ///
    /// # Panics
    ///
    /// If `pid` is unknown, already exited, not a child of `caller`, or has
    /// threads blocked joining it.
    pub fn unalloc(&self, caller: Pid, pid: Pid) {
        assert!(
            (self.config.pid_min..=self.config.pid_max).contains(&pid),
            "unalloc of out-of-range pid {pid}"
        );
        let mut table = self.table.lock();

        let Some(rec) = table.lookup_mut(pid) else {
            panic!("unalloc of unknown pid {pid}");
        };
        assert!(!rec.has_exited(), "unalloc of exited pid {pid}");
        assert_eq!(rec.parent(), caller, "unalloc of pid {pid} by non-parent {caller}");
        assert_eq!(rec.joiners(), 0, "unalloc of pid {pid} with sleeping joiners");

        rec.abandon();
        table.remove_and_free(pid);
        debug!(pid, parent = caller, "Pid unallocated");
    }

    /// Give up interest in a child's exit status
    ///
    /// An exited child is reclaimed on the spot; a running one is reclaimed
    /// by its own `exit`.
    pub fn detach(&self, caller: Pid, pid: Pid) -> PidResult<()> {
        if is_reserved(pid) {
            return Err(PidError::InvalidArgument(InvalidReason::ReservedPid));
        }
        let mut table = self.table.lock();

        let rec = table.lookup(pid).ok_or(PidError::NoSuchProcess(pid))?;
        if rec.is_detached() {
            return Err(PidError::InvalidArgument(InvalidReason::Detached));
        }
        if rec.parent() != caller {
            return Err(PidError::InvalidArgument(InvalidReason::NotParent));
        }
        if rec.joiners() > 0 {
            return Err(PidError::InvalidArgument(InvalidReason::HasJoiners));
        }

        Self::detach_locked(&mut table, pid);
        Ok(())
    }

    /// Detach without the parent check; the record must have no joiners
    fn detach_locked(table: &mut PidTable, pid: Pid) {
        let Some(rec) = table.lookup_mut(pid) else {
            return;
        };
        if rec.has_exited() {
            rec.disown();
            table.remove_and_free(pid);
            debug!(pid, "Detached exited pid reclaimed");
        } else {
            rec.mark_detached();
            debug!(pid, "Pid detached");
        }
    }

    /// Terminate `caller` with `status`
    ///
    /// Disowns every child (detaching them too when `auto_detach` is set),
    /// wakes all joiners, and reclaims the record right away if nobody can
    /// collect the status anymore. Never blocks.
    ///
    /// # Panics
    ///
    /// If `caller` has no record or already exited.
    pub fn exit(&self, caller: Pid, status: ExitStatus, auto_detach: bool) {
        let mut table = self.table.lock();

        let Some(rec) = table.lookup_mut(caller) else {
            panic!("exit of unknown pid {caller}");
        };
        rec.mark_exited(status);
        let children = rec.take_children();
        let exit_condition = rec.exit_condition();

        for child in children {
            Self::disown_child(&mut table, caller, child, auto_detach);
        }

        exit_condition.notify_all();

        let Some(rec) = table.lookup_mut(caller) else {
            panic!("pid {caller} vanished during exit");
        };
        let orphaned = rec.is_detached() || rec.parent() == INVALID_PID;
        if orphaned && rec.joiners() == 0 {
            rec.disown();
            table.remove_and_free(caller);
            debug!(pid = caller, status, "Pid exited and reclaimed");
        } else {
            debug!(pid = caller, status, joiners = rec.joiners(), "Pid exited");
        }
    }

    fn disown_child(table: &mut PidTable, parent: Pid, child: Pid, auto_detach: bool) {
        let Some(kid) = table.lookup_mut(child) else {
            return;
        };
        // Already joined, or the identifier was reused by someone else's child
        if kid.parent() != parent {
            return;
        }
        kid.disown();

        if kid.joiners() > 0 {
            return;
        }
        if auto_detach && !kid.is_detached() {
            Self::detach_locked(table, child);
        } else if kid.is_reclaimable() {
            table.remove_and_free(child);
            debug!(pid = child, parent, "Orphaned zombie reclaimed");
        }
    }

    /// Wait for `target` to exit and collect its status
    ///
    /// Returns the target's identifier and writes its status to `status`
    /// when given. With [`JoinFlags::NO_HANG`] a still-running target yields
    /// `INVALID_PID` without blocking.
    #[instrument(level = "debug", skip(self, status))]
    pub fn join(
        &self,
        caller: Pid,
        target: Pid,
        status: Option<&mut ExitStatus>,
        flags: JoinFlags,
    ) -> PidResult<Pid> {
        if is_reserved(target) {
            return Err(PidError::InvalidArgument(InvalidReason::ReservedPid));
        }
        let mut table = self.table.lock();

        let rec = table
            .lookup_mut(target)
            .ok_or(PidError::NoSuchProcess(target))?;
        if rec.is_detached() {
            return Err(PidError::InvalidArgument(InvalidReason::Detached));
        }
        if target == caller {
            return Err(PidError::Deadlock(target));
        }

        let exit_status = if let Some(exit_status) = rec.exit_status() {
            // Woken joiners still on their way back own the reclaim
            if rec.joiners() == 0 {
                rec.disown();
                table.remove_and_free(target);
            }
            exit_status
        } else {
            if flags.contains(JoinFlags::NO_HANG) {
                return Ok(INVALID_PID);
            }
            rec.add_joiner();
            Self::wait_for_exit(&mut table, target)
        };

        debug!(pid = target, status = exit_status, "Pid joined");
        if let Some(out) = status {
            *out = exit_status;
        }
        Ok(target)
    }

    /// Sleep until `target` exits, then drop this joiner's reference
    fn wait_for_exit(table: &mut MutexGuard<'_, PidTable>, target: Pid) -> ExitStatus {
        let status = loop {
            let Some(rec) = table.lookup(target) else {
                panic!("pid {target} reclaimed under a joiner");
            };
            if let Some(status) = rec.exit_status() {
                break status;
            }
            let exit_condition = rec.exit_condition();
            exit_condition.wait(table);
        };

        let Some(rec) = table.lookup_mut(target) else {
            panic!("pid {target} reclaimed under a joiner");
        };
        if rec.release_joiner().is_now() {
            table.remove_and_free(target);
        }
        status
    }

    /// Blocking join that hands back the exit status
    pub fn wait(&self, caller: Pid, target: Pid) -> PidResult<ExitStatus> {
        let mut status = 0;
        self.join(caller, target, Some(&mut status), JoinFlags::NONE)?;
        Ok(status)
    }

    /// Whether `pid` currently has a record
    #[must_use]
    pub fn contains(&self, pid: Pid) -> bool {
        pid != INVALID_PID && self.table.lock().lookup(pid).is_some()
    }

    /// Parent link of `pid`, `INVALID_PID` once disowned
    pub fn parent_of(&self, pid: Pid) -> PidResult<Pid> {
        if pid == INVALID_PID {
            return Err(PidError::NoSuchProcess(pid));
        }
        self.table
            .lock()
            .lookup(pid)
            .map(PidRecord::parent)
            .ok_or(PidError::NoSuchProcess(pid))
    }

    /// Number of threads currently blocked joining `pid`
    pub fn joiners(&self, pid: Pid) -> PidResult<usize> {
        if pid == INVALID_PID {
            return Err(PidError::NoSuchProcess(pid));
        }
        self.table
            .lock()
            .lookup(pid)
            .map(PidRecord::joiners)
            .ok_or(PidError::NoSuchProcess(pid))
    }

    /// Whether `pid` is a live child of `parent`
    #[must_use]
    pub fn is_child(&self, parent: Pid, pid: Pid) -> bool {
        self.table.lock().is_child_of(pid, parent)
    }

    /// Snapshot of the table counters
    #[must_use]
    pub fn stats(&self) -> PidStats {
        self.table.lock().stats()
    }
}
