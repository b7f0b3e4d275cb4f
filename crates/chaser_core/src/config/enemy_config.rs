//! Enemy belief tracking parameters.

use serde::{Deserialize, Serialize};

/// Parameters of the opponent probability field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    /// Bounded sighting history length.
    pub sighting_history_limit: usize,
    /// Mass below this threshold is dropped instead of diffused.
    pub probability_floor: f64,
    /// Decay applied to every diffusion step; models information
    /// staleness. Must stay below 1 so total mass never grows.
    pub diffusion_decay: f64,
    /// A sighting at most this many turns old pins the predicted position.
    pub recent_sighting_turns: u32,
    /// Belief mass at a destination tile above which it is unsafe to enter.
    pub danger_self_threshold: f64,
    /// Belief mass at any neighbor of a destination above which it is
    /// unsafe to enter (the opponent could seal it next turn).
    pub danger_neighbor_threshold: f64,
    /// Total belief mass around a destination above which it is unsafe.
    pub danger_surrounding_threshold: f64,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            sighting_history_limit: 20,
            probability_floor: 0.01,
            diffusion_decay: 0.95,
            recent_sighting_turns: 2,
            danger_self_threshold: 0.20,
            danger_neighbor_threshold: 0.30,
            danger_surrounding_threshold: 0.5,
        }
    }
}
