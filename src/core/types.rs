/*!
 * Core Types
 * Common types used across the kernel
 */

use serde::{Deserialize, Serialize};

/// Process ID type
pub type Pid = u32;

/// Exit status reported by a process to its joiners
pub type ExitStatus = i32;

/// Reserved identifier meaning "no process"
///
/// Also used as the parent link of records whose parent has exited,
/// joined them, or otherwise disowned them.
pub const INVALID_PID: Pid = 0;

/// Identifier of the first process, installed by bootstrap
///
/// It has no parent and can never be joined or detached.
pub const BOOTUP_PID: Pid = 1;

/// Status stored in a fresh record until exit overwrites it
pub(crate) const UNSET_EXIT_STATUS: ExitStatus = 0xbaad;

/// Status stored when an allocation is rolled back before the thread ran
pub(crate) const UNALLOC_EXIT_STATUS: ExitStatus = 0xdead;

/// Flags accepted by join
///
/// Only `NO_HANG` is defined. Unknown bits are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JoinFlags(u32);

impl JoinFlags {
    /// Block until the target exits
    pub const NONE: Self = Self(0);

    /// Return `INVALID_PID` instead of blocking when the target is still running
    pub const NO_HANG: Self = Self(1);

    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline(always)]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for JoinFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Returns true for the two reserved identifiers
#[inline(always)]
#[must_use]
pub const fn is_reserved(pid: Pid) -> bool {
    pid == INVALID_PID || pid == BOOTUP_PID
}
