/*!
 * Pid Manager Builder
 * Builder pattern for PidManager construction
 */

use super::lifecycle::PidManager;
use crate::core::config::{ConfigResult, PidConfig};
use crate::core::types::Pid;

/// Builder for PidManager
#[derive(Debug, Clone, Default)]
pub struct PidManagerBuilder {
    config: PidConfig,
}

impl PidManagerBuilder {
    /// Create a new builder with the default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all limits at once
    pub fn with_config(mut self, config: PidConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the number of table slots
    pub fn with_capacity(mut self, procs_max: usize) -> Self {
        self.config = self.config.with_capacity(procs_max);
        self
    }

    /// Set the allocatable identifier range
    pub fn with_pid_range(mut self, pid_min: Pid, pid_max: Pid) -> Self {
        self.config = self.config.with_pid_range(pid_min, pid_max);
        self
    }

    /// Validate the limits and bootstrap the table
    pub fn build(self) -> ConfigResult<PidManager> {
        self.config.validate()?;
        Ok(PidManager::with_config(self.config))
    }
}
