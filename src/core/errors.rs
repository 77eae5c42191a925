/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use super::types::Pid;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errno values surfaced to the syscall layer
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Errno {
    Esrch = 3,
    Eagain = 11,
    Enomem = 12,
    Einval = 22,
    Edeadlk = 35,
}

impl Errno {
    #[inline(always)]
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Errno::Esrch => "ESRCH",
            Errno::Eagain => "EAGAIN",
            Errno::Enomem => "ENOMEM",
            Errno::Einval => "EINVAL",
            Errno::Edeadlk => "EDEADLK",
        }
    }
}

impl std::fmt::Display for Errno {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Why an operation was rejected with EINVAL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    /// Target is the invalid or bootstrap sentinel
    ReservedPid,
    /// Target was already detached
    Detached,
    /// Caller is not the target's parent
    NotParent,
    /// Target has threads blocked in join
    HasJoiners,
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            InvalidReason::ReservedPid => "reserved identifier",
            InvalidReason::Detached => "process is detached",
            InvalidReason::NotParent => "caller is not the parent",
            InvalidReason::HasJoiners => "process has active joiners",
        };
        f.write_str(reason)
    }
}

/// Pid management errors with serialization support
///
/// Exhaustion errors (`TableFull`, `OutOfMemory`) are recoverable by the caller.
/// The rest indicate misuse and are never retried internally.
#[derive(Error, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum PidError {
    #[error("Process table full")]
    #[diagnostic(
        code(pid::table_full),
        help("Every slot holds a live record. Join or detach exited processes.")
    )]
    TableFull,

    #[error("Out of memory allocating process record")]
    #[diagnostic(code(pid::out_of_memory))]
    OutOfMemory,

    #[error("Invalid argument: {0}")]
    #[diagnostic(
        code(pid::invalid_argument),
        help("The operation is not permitted in the target's current state.")
    )]
    InvalidArgument(InvalidReason),

    #[error("Process {0} not found")]
    #[diagnostic(
        code(pid::no_such_process),
        help("The process may have been reclaimed or never existed.")
    )]
    NoSuchProcess(Pid),

    #[error("Process {0} cannot join itself")]
    #[diagnostic(code(pid::deadlock))]
    Deadlock(Pid),
}

impl PidError {
    /// Errno code for the syscall layer
    #[must_use]
    pub const fn errno(&self) -> Errno {
        match self {
            PidError::TableFull => Errno::Eagain,
            PidError::OutOfMemory => Errno::Enomem,
            PidError::InvalidArgument(_) => Errno::Einval,
            PidError::NoSuchProcess(_) => Errno::Esrch,
            PidError::Deadlock(_) => Errno::Edeadlk,
        }
    }

    /// Whether a caller may reasonably retry later
    #[must_use]
    pub const fn is_exhaustion(&self) -> bool {
        matches!(self, PidError::TableFull | PidError::OutOfMemory)
    }
}

impl From<std::collections::TryReserveError> for PidError {
    fn from(_: std::collections::TryReserveError) -> Self {
        PidError::OutOfMemory
    }
}

/// Pid operation result
pub type PidResult<T> = Result<T, PidError>;
