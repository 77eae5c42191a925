/*!
 * Process Record
 * Per-process identity, exit status and parent/child links
 */

use crate::core::errors::PidResult;
use crate::core::types::{ExitStatus, Pid, INVALID_PID, UNALLOC_EXIT_STATUS, UNSET_EXIT_STATUS};
use parking_lot::Condvar;
use std::sync::Arc;

/// Who has to reclaim a record after a lifecycle step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Reap {
    /// The caller must remove the record from the table now
    Now,
    /// Someone else still holds an interest in the record
    Later,
}

impl Reap {
    #[inline(always)]
    pub const fn is_now(self) -> bool {
        matches!(self, Reap::Now)
    }
}

/// Metadata for one live identifier
///
/// All fields are guarded by the table lock. The exit condition is shared
/// out through an `Arc` so a joiner can sleep on it after releasing the
/// borrow of the table.
#[derive(Debug)]
pub struct PidRecord {
    pid: Pid,
    parent: Pid,
    exited: bool,
    exit_status: ExitStatus,
    detached: bool,
    joiners: usize,
    children: Vec<Pid>,
    exit_condition: Arc<Condvar>,
}

impl PidRecord {
    /// Create a running, attached record
    #[must_use]
    pub fn new(pid: Pid, parent: Pid) -> Self {
        debug_assert_ne!(pid, INVALID_PID);
        Self {
            pid,
            parent,
            exited: false,
            exit_status: UNSET_EXIT_STATUS,
            detached: false,
            joiners: 0,
            children: Vec::new(),
            exit_condition: Arc::new(Condvar::new()),
        }
    }

    #[inline(always)]
    #[must_use]
    pub const fn pid(&self) -> Pid {
        self.pid
    }

    #[inline(always)]
    #[must_use]
    pub const fn parent(&self) -> Pid {
        self.parent
    }

    #[inline(always)]
    #[must_use]
    pub const fn has_exited(&self) -> bool {
        self.exited
    }

    /// Exit status, once the process has exited
    #[inline]
    #[must_use]
    pub const fn exit_status(&self) -> Option<ExitStatus> {
        if self.exited {
            Some(self.exit_status)
        } else {
            None
        }
    }

    #[inline(always)]
    #[must_use]
    pub const fn is_detached(&self) -> bool {
        self.detached
    }

    #[inline(always)]
    #[must_use]
    pub const fn joiners(&self) -> usize {
        self.joiners
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[Pid] {
        &self.children
    }

    /// Exited and parentless: nobody can legitimately ask for the status anymore
    #[inline(always)]
    #[must_use]
    pub const fn is_reclaimable(&self) -> bool {
        self.exited && self.parent == INVALID_PID
    }

    #[inline]
    pub(crate) fn exit_condition(&self) -> Arc<Condvar> {
        Arc::clone(&self.exit_condition)
    }

    /// Record a new child, growing the list fallibly
    ///
    /// `live` is consulted to prune stale entries once the list reaches
    /// `bound`, so it never holds more than one entry per table slot.
    pub(crate) fn adopt(
        &mut self,
        child: Pid,
        bound: usize,
        live: impl Fn(Pid) -> bool,
    ) -> PidResult<()> {
        if self.children.len() >= bound {
            self.children.retain(|&c| live(c));
        }
        // A recycled identifier may still have a stale entry
        if self.children.contains(&child) {
            return Ok(());
        }
        self.children.try_reserve(1)?;
        self.children.push(child);
        Ok(())
    }

    pub(crate) fn take_children(&mut self) -> Vec<Pid> {
        std::mem::take(&mut self.children)
    }

    #[inline]
    pub(crate) fn disown(&mut self) {
        self.parent = INVALID_PID;
    }

    #[inline]
    pub(crate) fn mark_detached(&mut self) {
        debug_assert!(!self.detached);
        self.detached = true;
    }

    /// Store the exit status; panics on a second exit
    pub(crate) fn mark_exited(&mut self, status: ExitStatus) {
        assert!(!self.exited, "pid {} exited twice", self.pid);
        self.exit_status = status;
        self.exited = true;
    }

    /// Force a never-started record into a reclaimable state
    pub(crate) fn abandon(&mut self) {
        self.exit_status = UNALLOC_EXIT_STATUS;
        self.exited = true;
        self.parent = INVALID_PID;
    }

    #[inline]
    pub(crate) fn add_joiner(&mut self) {
        self.joiners += 1;
    }

    /// Drop one joiner reference; the last one out reaps
    pub(crate) fn release_joiner(&mut self) -> Reap {
        assert!(self.joiners > 0, "pid {} joiner count underflow", self.pid);
        self.joiners -= 1;
        if self.joiners == 0 {
            self.parent = INVALID_PID;
            Reap::Now
        } else {
            Reap::Later
        }
    }
}
