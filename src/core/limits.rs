/*!
 * System Limits and Constants
 *
 * Centralized location for the process table limits and identifier range.
 */

use super::types::Pid;

// =============================================================================
// PROCESS TABLE LIMITS
// =============================================================================

/// Maximum number of simultaneously live identifiers
/// Table capacity; independent of the width of the identifier range
pub const PROCS_MAX: usize = 128;

/// Smallest identifier handed out by allocation
/// Everything below is reserved for the invalid and bootstrap sentinels
pub const PID_MIN: Pid = 2;

/// Largest identifier handed out by allocation
/// The allocation cursor wraps back to `PID_MIN` past this value
pub const PID_MAX: Pid = 32767;

/// Extra iterations tolerated by the allocation scan beyond two full sweeps
/// Absorbs the boundary cases around the cursor wrap
pub const ALLOC_SCAN_SLACK: usize = 5;
