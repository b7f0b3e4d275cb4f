//! Trap classification thresholds.

use serde::{Deserialize, Serialize};

/// Parameters of passive and probe-driven trap classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrapConfig {
    /// Maximum open-run length (cells between the agent and the wall) that
    /// a probe still classifies as a dead-end pocket. The ray is scanned
    /// one cell past this so a wall sealing exactly this run is seen.
    pub probe_window: usize,
    /// Lateral escape cells required along the open run for the pocket to
    /// count as escapable.
    pub required_escape_options: usize,
    /// Probe rays older than this many turns are purged from the cache.
    pub probe_cache_ttl: u32,
    /// Maximum age of a cached ray that may substitute for a new probe.
    pub probe_skip_max_age: u32,
    /// Walkable cells required beyond the target in a cached ray to call
    /// the target pass-through without probing again.
    pub probe_skip_walkable_run: usize,
    /// Known-blocked orthogonal neighbors that condemn an item tile in the
    /// map-wide sweep.
    pub walled_item_neighbor_threshold: usize,
    /// Reachable-cell count at or below which a coordinate is a dead end.
    pub dead_end_threshold: usize,
    /// Accessible-space size at or below which entering a tile is refused
    /// by the move-safety check.
    pub move_space_threshold: usize,
    /// BFS early-exit bound for the accessible-space estimate.
    pub space_size_limit: usize,
    /// BFS node bound for reachability counting.
    pub reachability_limit: usize,
}

impl Default for TrapConfig {
    fn default() -> Self {
        Self {
            probe_window: 3,
            required_escape_options: 1,
            probe_cache_ttl: 10,
            probe_skip_max_age: 9,
            probe_skip_walkable_run: 3,
            walled_item_neighbor_threshold: 3,
            dead_end_threshold: 3,
            move_space_threshold: 2,
            space_size_limit: 12,
            reachability_limit: 30,
        }
    }
}
