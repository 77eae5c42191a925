/*!
 * Pid Kernel Library
 * Process identity and exit-lifecycle management exposed as a library
 */

pub mod core;
pub mod monitoring;
pub mod process;
pub mod syscalls;

// Re-exports
pub use crate::core::{
    ConfigError, Errno, ExitStatus, InvalidReason, JoinFlags, Pid, PidConfig, PidError,
    PidResult, BOOTUP_PID, INVALID_PID,
};
pub use monitoring::init_tracing;
pub use process::{spawn, PidManager, PidManagerBuilder, PidStats, SpawnError};
pub use syscalls::{sys_detach, sys_waitpid};
