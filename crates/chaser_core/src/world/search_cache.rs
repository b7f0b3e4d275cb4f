//! Short-lived cache of raw probe rays.
//!
//! A probe is a costed action; when a recent ray already proves that a
//! suspicious coordinate is pass-through, the core marks it safe instead
//! of spending another probe on it.

use serde::{Deserialize, Serialize};

use crate::config::TrapConfig;
use crate::types::{Coord, Direction, TileKind};

/// One stored probe ray. `tiles[i]` describes the cell at distance `i + 1`
/// from `origin` along `direction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeRecord {
    pub turn: u32,
    pub origin: Coord,
    pub direction: Direction,
    pub tiles: Vec<Option<TileKind>>,
}

/// Bounded store of recent probe rays, purged by age.
#[derive(Debug, Clone, Default)]
pub struct SearchCache {
    records: Vec<ProbeRecord>,
}

impl SearchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a ray and drop every record older than the configured TTL.
    pub fn insert(&mut self, record: ProbeRecord, now: u32, config: &TrapConfig) {
        self.records.push(record);
        self.records
            .retain(|r| now.saturating_sub(r.turn) <= config.probe_cache_ttl);
    }

    /// Whether a recent ray in `direction` already covers `target` and
    /// shows enough walkable cells beyond it to call it pass-through.
    pub fn covers_pass_through(
        &self,
        target: Coord,
        direction: Direction,
        now: u32,
        config: &TrapConfig,
    ) -> bool {
        let (dx, dy) = direction.delta();
        for record in &self.records {
            if now.saturating_sub(record.turn) > config.probe_skip_max_age {
                continue;
            }
            if record.direction != direction {
                continue;
            }
            for dist in 1..=record.tiles.len() {
                let cell = record.origin.offset(dx * dist as i32, dy * dist as i32);
                if cell != target {
                    continue;
                }
                // The ray covers the target; require a walkable run beyond
                // it to prove the tile is not a pocket.
                let beyond = &record.tiles[dist..];
                let walkable = beyond
                    .iter()
                    .take(config.probe_skip_walkable_run)
                    .filter(|t| t.map_or(false, TileKind::is_walkable))
                    .count();
                if walkable >= config.probe_skip_walkable_run {
                    return true;
                }
                break;
            }
        }
        false
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
