//! Tuning constants for every subsystem, centralised in one place.
//!
//! All thresholds, weights and decay factors are empirically tuned values
//! carried over from play-testing; none of them is derived. Keeping them in
//! serde-friendly structs makes balance experiments a matter of loading a
//! JSON override instead of recompiling.

mod enemy_config;
mod localizer_config;
mod path_config;
mod trap_config;

pub use enemy_config::EnemyConfig;
pub use localizer_config::LocalizerConfig;
pub use path_config::PathConfig;
pub use trap_config::TrapConfig;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::types::MapDims;

/// Aggregate configuration for the whole core.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CoreConfig {
    /// Known map dimensions (the ruleset fixes them; only the origin is
    /// unknown).
    #[serde(default)]
    pub map: MapDims,
    #[serde(default)]
    pub localizer: LocalizerConfig,
    #[serde(default)]
    pub trap: TrapConfig,
    #[serde(default)]
    pub enemy: EnemyConfig,
    #[serde(default)]
    pub path: PathConfig,
}

impl CoreConfig {
    /// Load a configuration from a JSON document. Missing fields fall back
    /// to the tuned defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: CoreConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.map.width <= 0 || self.map.height <= 0 {
            return Err(CoreError::InvalidDims {
                width: self.map.width,
                height: self.map.height,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = CoreConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.map.width, 15);
        assert_eq!(config.map.height, 17);
    }

    #[test]
    fn test_json_override() {
        let config =
            CoreConfig::from_json_str(r#"{"map":{"width":11,"height":11},"enemy":{"diffusion_decay":0.9}}"#)
                .unwrap();
        assert_eq!(config.map.width, 11);
        assert!((config.enemy.diffusion_decay - 0.9).abs() < 1e-9);
        // Untouched sections keep their tuned defaults.
        assert_eq!(config.path.node_budget, 500);
    }

    #[test]
    fn test_rejects_degenerate_map() {
        let err = CoreConfig::from_json_str(r#"{"map":{"width":0,"height":17}}"#);
        assert!(err.is_err());
    }
}
