/*!
 * Syscalls Module
 * Thin entry points the syscall dispatcher forwards to
 */

pub mod process;

pub use process::{sys_detach, sys_waitpid};
