//! Tunable parameters of a grove.

use std::time::Duration;

use berry_grove_core::{DEFAULT_GRAVITY, DEFAULT_LAUNCH_ANGLE_DEGREES};
use berry_grove_system_projectiles::Config as ProjectileConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_POOL_CAPACITY: u32 = 8;
const DEFAULT_FIXED_STEP_SECONDS: f32 = 0.02;

/// Parameters used to construct a [`crate::Grove`].
///
/// Every field has a default so partial documents deserialize cleanly.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GroveConfig {
    /// Number of projectile actors allocated up front.
    pub pool_capacity: u32,
    /// Upward launch angle in degrees applied to every shot.
    pub launch_angle_degrees: f32,
    /// Gravity magnitude applied to every shot.
    pub gravity: f32,
    /// Length of one flight integration step in seconds.
    pub fixed_step_seconds: f32,
}

impl Default for GroveConfig {
    fn default() -> Self {
        Self {
            pool_capacity: DEFAULT_POOL_CAPACITY,
            launch_angle_degrees: DEFAULT_LAUNCH_ANGLE_DEGREES,
            gravity: DEFAULT_GRAVITY,
            fixed_step_seconds: DEFAULT_FIXED_STEP_SECONDS,
        }
    }
}

impl GroveConfig {
    /// Checks the configuration and returns the fixed integration step.
    ///
    /// Launch angle and gravity are not checked here: a degenerate
    /// combination makes every shot miss instead of failing construction.
    pub fn validate(&self) -> Result<Duration, ConfigError> {
        if self.pool_capacity == 0 {
            return Err(ConfigError::EmptyPool);
        }
        if !self.fixed_step_seconds.is_finite() || self.fixed_step_seconds <= 0.0 {
            return Err(ConfigError::InvalidFixedStep(self.fixed_step_seconds));
        }
        match Duration::try_from_secs_f32(self.fixed_step_seconds) {
            Ok(step) if !step.is_zero() => Ok(step),
            _ => Err(ConfigError::InvalidFixedStep(self.fixed_step_seconds)),
        }
    }

    /// Ballistic parameters handed to the projectile pool.
    #[must_use]
    pub const fn projectile_config(&self) -> ProjectileConfig {
        ProjectileConfig::new(self.launch_angle_degrees, self.gravity)
    }
}

/// Reasons a [`GroveConfig`] is rejected.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// The projectile pool would have no actors.
    #[error("projectile pool capacity must be at least one")]
    EmptyPool,
    /// The fixed step is not a number or does not round to a positive
    /// [`Duration`].
    #[error("fixed step must be a positive number of seconds, got {0}")]
    InvalidFixedStep(f32),
}
