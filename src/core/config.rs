/*!
 * Process Table Configuration
 *
 * Capacity and identifier range for a pid manager, with environment overrides.
 */

use super::limits::{PID_MAX, PID_MIN, PROCS_MAX};
use super::types::{Pid, BOOTUP_PID};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Table capacity {0} is too small, need at least 2 slots")]
    CapacityTooSmall(usize),

    #[error("Minimum pid {0} collides with a reserved identifier")]
    ReservedPidMin(Pid),

    #[error("Empty pid range: {min} > {max}")]
    EmptyRange { min: Pid, max: Pid },

    #[error("Pid range {min}..={max} cannot hold {capacity} live identifiers")]
    RangeTooNarrow { min: Pid, max: Pid, capacity: usize },

    #[error("Invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Limits of one process table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct PidConfig {
    /// Number of slots in the table
    pub procs_max: usize,
    /// First allocatable identifier
    pub pid_min: Pid,
    /// Last allocatable identifier
    pub pid_max: Pid,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            procs_max: PROCS_MAX,
            pid_min: PID_MIN,
            pid_max: PID_MAX,
        }
    }
}

impl PidConfig {
    /// Build a configuration from defaults overridden by environment variables
    ///
    /// Environment variables:
    /// - KERNEL_PROCS_MAX: table capacity
    /// - KERNEL_PID_MIN: first allocatable identifier
    /// - KERNEL_PID_MAX: last allocatable identifier
    pub fn from_env() -> ConfigResult<Self> {
        let mut config = Self::default();
        if let Some(v) = env_override("KERNEL_PROCS_MAX")? {
            config.procs_max = v;
        }
        if let Some(v) = env_override("KERNEL_PID_MIN")? {
            config.pid_min = v;
        }
        if let Some(v) = env_override("KERNEL_PID_MAX")? {
            config.pid_max = v;
        }
        config.validate()?;
        Ok(config)
    }

    #[inline]
    #[must_use]
    pub fn with_capacity(mut self, procs_max: usize) -> Self {
        self.procs_max = procs_max;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_pid_range(mut self, pid_min: Pid, pid_max: Pid) -> Self {
        self.pid_min = pid_min;
        self.pid_max = pid_max;
        self
    }

    /// Check that the table can be bootstrapped with these limits
    pub fn validate(&self) -> ConfigResult<()> {
        if self.procs_max < 2 {
            return Err(ConfigError::CapacityTooSmall(self.procs_max));
        }
        if self.pid_min <= BOOTUP_PID {
            return Err(ConfigError::ReservedPidMin(self.pid_min));
        }
        if self.pid_min > self.pid_max {
            return Err(ConfigError::EmptyRange {
                min: self.pid_min,
                max: self.pid_max,
            });
        }
        let width = (self.pid_max - self.pid_min) as u64 + 1;
        if width < self.procs_max as u64 {
            return Err(ConfigError::RangeTooNarrow {
                min: self.pid_min,
                max: self.pid_max,
                capacity: self.procs_max,
            });
        }
        Ok(())
    }
}

fn env_override<T: std::str::FromStr>(var: &'static str) -> ConfigResult<Option<T>> {
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value }),
        Err(_) => Ok(None),
    }
}
