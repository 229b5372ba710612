// ============================================================================
// Pipeline Configuration
// Sizing and validation for the ingress pipeline
// ============================================================================

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for the event pipeline.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PipelineConfig {
    /// Capacity of the SPSC ingress ring. Must be a non-zero power of two.
    pub ring_capacity: usize,

    /// Number of levels returned by depth-snapshot queries.
    pub depth_levels: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ring_capacity: 8192,
            depth_levels: 10,
        }
    }
}

impl PipelineConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    /// Returns a `ConfigError` describing the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ring_capacity == 0 {
            return Err(ConfigError::ZeroRingCapacity);
        }
        if !self.ring_capacity.is_power_of_two() {
            return Err(ConfigError::RingCapacityNotPowerOfTwo {
                capacity: self.ring_capacity,
            });
        }
        if self.depth_levels == 0 {
            return Err(ConfigError::ZeroDepthLevels);
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("ring capacity must be non-zero")]
    ZeroRingCapacity,

    #[error("ring capacity must be a power of two, got {capacity}")]
    RingCapacityNotPowerOfTwo { capacity: usize },

    #[error("depth levels must be non-zero")]
    ZeroDepthLevels,
}
