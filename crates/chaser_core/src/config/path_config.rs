//! Pathfinder cost weights and budgets.

use serde::{Deserialize, Serialize};

/// Parameters of the A* search and its risk costs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Node-expansion ceiling; exceeding it yields "no path" so a single
    /// query can never blow the per-turn latency budget.
    pub node_budget: usize,
    /// Penalty for stepping onto the same tile as a seen enemy.
    pub enemy_contact_penalty: f32,
    /// Penalty tiers for Manhattan distance 1, 2 and 3 to a seen enemy.
    pub enemy_distance_penalties: [f32; 3],
    /// Belief probability above which a tile accrues a belief penalty.
    pub belief_threshold: f64,
    /// Penalty per unit of belief probability at the candidate tile.
    pub belief_penalty_gain: f32,
    /// Neighbor belief probability above which the neighborhood penalty
    /// applies.
    pub belief_neighbor_threshold: f64,
    /// Penalty per unit of the maximum neighbor belief probability.
    pub belief_neighbor_gain: f32,
    /// Cost added per previous visit of a tile; discourages retreading.
    pub revisit_penalty: f32,
    /// Cost of changing direction; rewards straight-line travel.
    pub turn_penalty: f32,
    /// Cost of crossing a non-goal item when the caller wants to save it.
    pub item_detour_penalty: f32,
    /// Weight of the nearest-known-item heuristic for predicate goals.
    pub heuristic_item_weight: f32,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            node_budget: 500,
            enemy_contact_penalty: 100.0,
            enemy_distance_penalties: [30.0, 10.0, 3.0],
            belief_threshold: 0.1,
            belief_penalty_gain: 20.0,
            belief_neighbor_threshold: 0.2,
            belief_neighbor_gain: 5.0,
            revisit_penalty: 0.5,
            turn_penalty: 0.3,
            item_detour_penalty: 2.0,
            heuristic_item_weight: 0.5,
        }
    }
}
