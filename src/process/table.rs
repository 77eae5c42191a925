/*!
 * Process Table
 *
 * Fixed-capacity slot table owning every live record. A record for `pid`
 * lives at `pid % capacity`; allocation skips identifiers whose slot is
 * taken, so there is never more than one record per slot.
 *
 * Every method assumes the caller holds the table lock, which the borrow
 * of `PidTable` out of the manager's mutex guard enforces.
 */

use super::record::PidRecord;
use crate::core::config::PidConfig;
use crate::core::errors::{PidError, PidResult};
use crate::core::limits::ALLOC_SCAN_SLACK;
use crate::core::types::{Pid, BOOTUP_PID, INVALID_PID};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Point-in-time view of the table counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PidStats {
    pub capacity: usize,
    pub allocated: usize,
    pub occupied_slots: usize,
    pub next_candidate: Pid,
}

impl PidStats {
    #[inline]
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.allocated == self.occupied_slots
    }
}

#[derive(Debug)]
pub struct PidTable {
    slots: Vec<Option<Box<PidRecord>>>,
    next_candidate: Pid,
    allocated: usize,
    pid_min: Pid,
    pid_max: Pid,
}

impl PidTable {
    /// Empty table holding only the bootstrap record
    pub fn bootstrap(config: &PidConfig) -> Self {
        let mut slots = Vec::with_capacity(config.procs_max);
        slots.resize_with(config.procs_max, || None);

        let mut table = Self {
            slots,
            next_candidate: config.pid_min,
            allocated: 0,
            pid_min: config.pid_min,
            pid_max: config.pid_max,
        };
        table.insert(BOOTUP_PID, PidRecord::new(BOOTUP_PID, INVALID_PID));
        table
    }

    #[inline(always)]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline(always)]
    #[must_use]
    pub const fn allocated(&self) -> usize {
        self.allocated
    }

    #[inline(always)]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.allocated == self.capacity()
    }

    #[inline(always)]
    fn slot_of(&self, pid: Pid) -> usize {
        pid as usize % self.slots.len()
    }

    /// Record for `pid`, if the slot holds that exact identifier
    #[must_use]
    pub fn lookup(&self, pid: Pid) -> Option<&PidRecord> {
        debug_assert_ne!(pid, INVALID_PID);
        self.slots[self.slot_of(pid)]
            .as_deref()
            .filter(|rec| rec.pid() == pid)
    }

    #[must_use]
    pub fn lookup_mut(&mut self, pid: Pid) -> Option<&mut PidRecord> {
        debug_assert_ne!(pid, INVALID_PID);
        let slot = self.slot_of(pid);
        self.slots[slot]
            .as_deref_mut()
            .filter(|rec| rec.pid() == pid)
    }

    /// Whether `pid` is live and still linked to `parent`
    #[must_use]
    pub fn is_child_of(&self, pid: Pid, parent: Pid) -> bool {
        pid != INVALID_PID && self.lookup(pid).is_some_and(|rec| rec.parent() == parent)
    }

    /// Install a record; the slot must be empty
    pub fn insert(&mut self, pid: Pid, record: PidRecord) {
        assert_ne!(pid, INVALID_PID);
        assert_eq!(record.pid(), pid, "record stored under foreign pid");
        let slot = self.slot_of(pid);
        assert!(self.slots[slot].is_none(), "pid slot {slot} already occupied");
        self.slots[slot] = Some(Box::new(record));
        self.allocated += 1;
    }

    /// Empty the slot of an exited, parentless record and free it
    pub fn remove_and_free(&mut self, pid: Pid) {
        let slot = self.slot_of(pid);
        let Some(record) = self.slots[slot].as_deref() else {
            panic!("reclaiming empty pid slot for {pid}");
        };
        // Checked in place so a failed assertion leaves the slot and count intact
        assert_eq!(record.pid(), pid, "reclaiming pid {pid} from a foreign slot");
        assert!(record.is_reclaimable(), "reclaiming live pid {pid}");
        assert_eq!(record.joiners(), 0, "reclaiming pid {pid} with sleeping joiners");
        self.slots[slot] = None;
        self.allocated -= 1;
        trace!(pid, allocated = self.allocated, "pid slot freed");
    }

    /// First identifier at or after the cursor whose slot is empty
    ///
    /// Fails with `TableFull` when every slot is taken. The scan is bounded
    /// by two sweeps of the table; running past that means the allocated
    /// count disagrees with the slots.
    pub fn find_free(&mut self) -> PidResult<Pid> {
        if self.is_full() {
            return Err(PidError::TableFull);
        }
        let limit = self.capacity() * 2 + ALLOC_SCAN_SLACK;
        let mut scanned = 0;
        while self.slots[self.slot_of(self.next_candidate)].is_some() {
            assert!(
                scanned < limit,
                "pid scan overran: {} allocated of {}",
                self.allocated,
                self.capacity()
            );
            scanned += 1;
            self.advance_cursor();
        }
        Ok(self.next_candidate)
    }

    #[inline]
    pub fn advance_cursor(&mut self) {
        self.next_candidate = if self.next_candidate >= self.pid_max {
            self.pid_min
        } else {
            self.next_candidate + 1
        };
    }

    /// Link `child` into `parent`'s child list
    ///
    /// Once the list reaches the table capacity, entries that no longer name
    /// a live child of `parent` are dropped first.
    pub fn adopt(&mut self, parent: Pid, child: Pid) -> PidResult<()> {
        if parent == INVALID_PID {
            return Err(PidError::NoSuchProcess(parent));
        }
        let bound = self.capacity();
        let Some(rec) = self.lookup(parent) else {
            return Err(PidError::NoSuchProcess(parent));
        };
        let live: Vec<Pid> = if rec.children().len() >= bound {
            rec.children()
                .iter()
                .copied()
                .filter(|&c| self.is_child_of(c, parent))
                .collect()
        } else {
            Vec::new()
        };

        let Some(rec) = self.lookup_mut(parent) else {
            return Err(PidError::NoSuchProcess(parent));
        };
        rec.adopt(child, bound, |c| live.contains(&c))
    }

    #[must_use]
    pub fn stats(&self) -> PidStats {
        PidStats {
            capacity: self.capacity(),
            allocated: self.allocated,
            occupied_slots: self.slots.iter().filter(|s| s.is_some()).count(),
            next_candidate: self.next_candidate,
        }
    }
}
