//! Generation configuration.
//!
//! Every knob the pipeline reads is resolved into one immutable
//! [`GenerationConfig`] value before anything runs. Generators receive the
//! pieces they need explicitly; nothing consults ambient global state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use galaxy_schema::{Region, SizeTier};

use crate::points::{DistributionMethod, GeneratorOptions};
use crate::rng::EngineKind;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("galaxy dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("core region exceeds galaxy bounds")]
    CoreRegionOutOfBounds,
    #[error("adjacency threshold must be positive, got {0}")]
    InvalidAdjacencyThreshold(f64),
    #[error("max gates per system must be at least 1")]
    InvalidGateCap,
    #[error("hidden gate fraction must be within [0, 1], got {0}")]
    InvalidHiddenFraction(f64),
    #[error("spacing factor must be non-negative, got {0}")]
    InvalidSpacingFactor(f64),
    #[error("chunk size must be at least 1")]
    InvalidChunkSize,
    #[error("sector grid size must be at least 1")]
    InvalidSectorGridSize,
}

/// Fully-resolved parameters for one galaxy generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub tier: SizeTier,
    pub name: Option<String>,
    pub width: u32,
    pub height: u32,
    pub core_region: Region,
    pub core_stars: u32,
    pub outer_stars: u32,
    pub distribution: DistributionMethod,
    pub engine: EngineKind,
    pub seed: u64,
    pub spacing_factor: f64,
    pub generator: GeneratorOptions,
    /// Minimum spacing between outer-region stars.
    pub outer_min_spacing: f64,
    pub adjacency_threshold: f64,
    pub max_gates_per_system: u32,
    pub hidden_gate_fraction: f64,
    /// Dormant gates in the outer region use their own, larger reach.
    pub outer_gate_max_distance: f64,
    pub outer_gates_per_system: u32,
    pub sector_grid_size: u32,
    pub chunk_size: usize,
    pub include_mirror: bool,
    pub mirror_max_gates_per_system: u32,
    pub mirror_hidden_gate_fraction: f64,
}

impl GenerationConfig {
    /// Resolve a config from a size tier with the standard defaults.
    /// Callers adjust public fields afterwards and then [`validate`].
    ///
    /// [`validate`]: GenerationConfig::validate
    pub fn from_tier(tier: SizeTier, seed: u64) -> Self {
        let bounds = tier.outer_bounds();
        Self {
            tier,
            name: None,
            width: bounds,
            height: bounds,
            core_region: tier.core_region(),
            core_stars: tier.core_stars(),
            outer_stars: tier.outer_stars(),
            distribution: DistributionMethod::RandomScatter,
            engine: EngineKind::default(),
            seed,
            spacing_factor: 0.75,
            generator: GeneratorOptions::default(),
            outer_min_spacing: 25.0,
            adjacency_threshold: tier.warp_gate_adjacency(),
            max_gates_per_system: 6,
            hidden_gate_fraction: 0.02,
            outer_gate_max_distance: 200.0,
            outer_gates_per_system: 2,
            sector_grid_size: tier.sector_grid_size(),
            chunk_size: 500,
            include_mirror: true,
            mirror_max_gates_per_system: 8,
            mirror_hidden_gate_fraction: 0.05,
        }
    }

    /// Fail fast on inconsistent parameters, before any persistence.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.core_region.x_max > self.width || self.core_region.y_max > self.height {
            return Err(ConfigError::CoreRegionOutOfBounds);
        }
        if self.adjacency_threshold <= 0.0 {
            return Err(ConfigError::InvalidAdjacencyThreshold(
                self.adjacency_threshold,
            ));
        }
        if self.max_gates_per_system == 0 || self.outer_gates_per_system == 0 {
            return Err(ConfigError::InvalidGateCap);
        }
        for fraction in [self.hidden_gate_fraction, self.mirror_hidden_gate_fraction] {
            if !(0.0..=1.0).contains(&fraction) {
                return Err(ConfigError::InvalidHiddenFraction(fraction));
            }
        }
        if self.spacing_factor < 0.0 {
            return Err(ConfigError::InvalidSpacingFactor(self.spacing_factor));
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize);
        }
        if self.sector_grid_size == 0 {
            return Err(ConfigError::InvalidSectorGridSize);
        }
        Ok(())
    }

    /// Derived configuration for the mirror (satellite) galaxy: same
    /// structure and distribution, denser gate network, never recursive.
    pub fn mirror_config(&self) -> Self {
        let mut mirror = self.clone();
        mirror.name = self
            .name
            .as_ref()
            .map(|name| format!("{name} (Mirror)"));
        mirror.max_gates_per_system = self.mirror_max_gates_per_system;
        mirror.hidden_gate_fraction = self.mirror_hidden_gate_fraction;
        mirror.include_mirror = false;
        mirror
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_tier_resolves_tier_numbers() {
        let config = GenerationConfig::from_tier(SizeTier::Medium, 42);
        assert_eq!(config.width, 1500);
        assert_eq!(config.core_stars, 300);
        assert_eq!(config.outer_stars, 450);
        assert_eq!(config.sector_grid_size, 10);
        assert!((config.adjacency_threshold - 100.0).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_dimensions() {
        let mut config = GenerationConfig::from_tier(SizeTier::Small, 1);
        config.width = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidDimensions {
                width: 0,
                height: 500
            })
        );
    }

    #[test]
    fn validate_rejects_bad_fraction() {
        let mut config = GenerationConfig::from_tier(SizeTier::Small, 1);
        config.hidden_gate_fraction = 1.5;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidHiddenFraction(1.5))
        );
    }

    #[test]
    fn validate_rejects_core_region_outside_bounds() {
        let mut config = GenerationConfig::from_tier(SizeTier::Small, 1);
        config.width = 100;
        config.height = 100;
        assert_eq!(config.validate(), Err(ConfigError::CoreRegionOutOfBounds));
    }

    #[test]
    fn validate_rejects_zero_chunk_size() {
        let mut config = GenerationConfig::from_tier(SizeTier::Small, 1);
        config.chunk_size = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidChunkSize));
    }

    #[test]
    fn mirror_config_is_denser_and_not_recursive() {
        let mut config = GenerationConfig::from_tier(SizeTier::Small, 9);
        config.name = Some("Vesper Reach".to_string());
        let mirror = config.mirror_config();
        assert_eq!(mirror.max_gates_per_system, 8);
        assert!((mirror.hidden_gate_fraction - 0.05).abs() < f64::EPSILON);
        assert!(!mirror.include_mirror);
        assert_eq!(mirror.name.as_deref(), Some("Vesper Reach (Mirror)"));
    }
}
