/*!
 * Process Module
 * Process identity, exit status and reaping
 */

pub mod builder;
pub mod lifecycle;
pub mod record;
pub mod spawn;
pub mod table;

// Re-export for convenience
pub use builder::PidManagerBuilder;
pub use lifecycle::PidManager;
pub use record::{PidRecord, Reap};
pub use spawn::{spawn, SpawnError, PANIC_EXIT_STATUS};
pub use table::{PidStats, PidTable};
