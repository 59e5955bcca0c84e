//! Configuration for the entity locker

use crate::domain::errors::{LockError, LockResult};
use serde::{Deserialize, Serialize};
use std::env;

/// Default number of entity locks a thread may hold in one category before
/// its next `lock` escalates to the category lock.
pub const DEFAULT_ESCALATION_THRESHOLD: usize = 10;

/// Environment variable overriding the escalation threshold.
pub const ESCALATION_THRESHOLD_ENV: &str = "ENTITY_LOCKER_ESCALATION_THRESHOLD";

/// Locker configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockerConfig {
    /// Entities held in one category before escalation (must be positive)
    pub escalation_threshold: usize,
}

impl Default for LockerConfig {
    fn default() -> Self {
        Self {
            escalation_threshold: DEFAULT_ESCALATION_THRESHOLD,
        }
    }
}

impl LockerConfig {
    /// Create a configuration with the given escalation threshold.
    pub fn with_threshold(escalation_threshold: usize) -> Self {
        Self {
            escalation_threshold,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ENTITY_LOCKER_ESCALATION_THRESHOLD`: escalation threshold (default: 10)
    pub fn from_env() -> LockResult<Self> {
        let config = match env::var(ESCALATION_THRESHOLD_ENV) {
            Ok(raw) => Self::with_threshold(parse_threshold(&raw)?),
            Err(_) => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject unusable values.
    pub fn validate(&self) -> LockResult<()> {
        if self.escalation_threshold == 0 {
            return Err(LockError::InvalidArgument(
                "escalation threshold must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_threshold(raw: &str) -> LockResult<usize> {
    raw.trim().parse().map_err(|_| {
        LockError::InvalidArgument(format!(
            "{} must be a positive integer, got {:?}",
            ESCALATION_THRESHOLD_ENV, raw
        ))
    })
}
