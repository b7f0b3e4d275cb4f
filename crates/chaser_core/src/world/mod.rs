//! Sparse knowledge base of everything the agent has observed.
//!
//! The world model is keyed by relative coordinates and only ever grows:
//! entries are merged, never deleted. Block entries are permanent (blocks
//! never disappear in this ruleset); item entries may later be overwritten
//! by the tile that covered or consumed them.

mod ingest;
mod search_cache;
mod trap_board;

pub use ingest::{
    ingest_ray, ingest_vision, mark_walled_item_traps, walled_item_ahead, ProbeIngest,
    VisionIngest,
};
pub use search_cache::{ProbeRecord, SearchCache};
pub use trap_board::{TrapBoard, TrapEntry, TrapReason, TrapStatus};

use fxhash::{FxHashMap, FxHashSet};

use crate::types::{Coord, TileKind};

/// Result of merging one observation into the world model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The coordinate was unobserved before.
    New,
    /// Known coordinate, tile kind changed (e.g. an item was consumed).
    Updated,
    /// Known coordinate, same tile kind.
    Unchanged,
    /// Rejected: blocks are permanent and are never downgraded.
    Rejected,
}

/// The agent's accumulated map knowledge.
#[derive(Debug, Clone)]
pub struct WorldModel {
    tiles: FxHashMap<Coord, TileKind>,
    visits: FxHashMap<Coord, u32>,
    observed_tiles: u32,
    observed_items: u32,
    /// Every coordinate ever seen holding an item, kept even after the
    /// item is consumed; symmetry replay needs the full history.
    historical_items: FxHashSet<Coord>,
    /// Blocks the agent itself created; excluded from symmetry inference.
    self_placed_blocks: FxHashSet<Coord>,
}

impl WorldModel {
    /// A fresh model with the spawn tile marked empty and visited once.
    pub fn new(spawn: Coord) -> Self {
        let mut model = Self {
            tiles: FxHashMap::default(),
            visits: FxHashMap::default(),
            observed_tiles: 0,
            observed_items: 0,
            historical_items: FxHashSet::default(),
            self_placed_blocks: FxHashSet::default(),
        };
        model.merge(spawn, TileKind::Empty);
        model.record_visit(spawn);
        model
    }

    #[inline]
    pub fn tile(&self, coord: Coord) -> Option<TileKind> {
        self.tiles.get(&coord).copied()
    }

    /// Merge one observation. Tracks exploration-density counters and the
    /// item history as side effects.
    pub fn merge(&mut self, coord: Coord, tile: TileKind) -> MergeOutcome {
        if tile == TileKind::Item {
            self.historical_items.insert(coord);
        }
        let outcome = match self.tiles.get(&coord) {
            None => {
                self.observed_tiles += 1;
                if tile == TileKind::Item {
                    self.observed_items += 1;
                }
                MergeOutcome::New
            }
            Some(&existing) if existing == tile => return MergeOutcome::Unchanged,
            Some(&TileKind::Block) => return MergeOutcome::Rejected,
            Some(_) => MergeOutcome::Updated,
        };
        self.tiles.insert(coord, tile);
        outcome
    }

    /// Write an inferred (not observed) tile. Never overwrites knowledge
    /// and does not touch the exploration counters.
    pub fn set_inferred(&mut self, coord: Coord, tile: TileKind) -> bool {
        if self.tiles.contains_key(&coord) {
            return false;
        }
        self.tiles.insert(coord, tile);
        true
    }

    #[inline]
    pub fn visits(&self, coord: Coord) -> u32 {
        self.visits.get(&coord).copied().unwrap_or(0)
    }

    pub fn record_visit(&mut self, coord: Coord) {
        *self.visits.entry(coord).or_insert(0) += 1;
    }

    pub fn mark_self_placed(&mut self, coord: Coord) {
        self.self_placed_blocks.insert(coord);
    }

    #[inline]
    pub fn is_self_placed(&self, coord: Coord) -> bool {
        self.self_placed_blocks.contains(&coord)
    }

    /// Coordinates currently known to hold an item.
    pub fn item_coords(&self) -> Vec<Coord> {
        self.tiles
            .iter()
            .filter(|&(_, &tile)| tile == TileKind::Item)
            .map(|(&coord, _)| coord)
            .collect()
    }

    pub fn historical_items(&self) -> impl Iterator<Item = Coord> + '_ {
        self.historical_items.iter().copied()
    }

    /// Iterate all known tiles.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, TileKind)> + '_ {
        self.tiles.iter().map(|(&coord, &tile)| (coord, tile))
    }

    #[inline]
    pub fn known_count(&self) -> usize {
        self.tiles.len()
    }

    #[inline]
    pub fn observed_tiles(&self) -> u32 {
        self.observed_tiles
    }

    #[inline]
    pub fn observed_items(&self) -> u32 {
        self.observed_items
    }

    /// Item share of everything observed so far; drives the external
    /// exploration-vs-collection tradeoff.
    pub fn item_density(&self) -> f64 {
        if self.observed_tiles < 10 {
            return 0.05;
        }
        f64::from(self.observed_items) / f64::from(self.observed_tiles)
    }

    /// Whether the enemy belief may diffuse through this coordinate.
    /// Unobserved tiles count as open so belief can leak into unexplored
    /// territory.
    #[inline]
    pub fn diffusion_walkable(&self, coord: Coord) -> bool {
        match self.tile(coord) {
            None => true,
            Some(tile) => tile.is_walkable(),
        }
    }
}

/// Whether a coordinate is known to be unenterable: a block, a standing
/// enemy, or any trap knowledge that forbids entry.
pub fn known_blocked(world: &WorldModel, traps: &TrapBoard, coord: Coord) -> bool {
    if traps.status(coord).blocks_movement() {
        return true;
    }
    matches!(world.tile(coord), Some(TileKind::Block) | Some(TileKind::Enemy))
}

/// Whether every exit of `coord` except the entry side is known blocked.
pub fn known_dead_end(
    world: &WorldModel,
    traps: &TrapBoard,
    coord: Coord,
    entry: crate::types::Direction,
) -> bool {
    crate::types::Direction::ALL
        .into_iter()
        .filter(|&dir| dir != entry)
        .all(|dir| known_blocked(world, traps, coord.step(dir)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_rules() {
        let mut world = WorldModel::new(Coord::ORIGIN);
        let c = Coord::new(1, 0);
        assert_eq!(world.merge(c, TileKind::Item), MergeOutcome::New);
        assert_eq!(world.merge(c, TileKind::Item), MergeOutcome::Unchanged);
        // Item consumed and covered by a block.
        assert_eq!(world.merge(c, TileKind::Block), MergeOutcome::Updated);
        // Blocks are permanent.
        assert_eq!(world.merge(c, TileKind::Empty), MergeOutcome::Rejected);
        assert_eq!(world.tile(c), Some(TileKind::Block));
        // The item history survives the overwrite.
        assert!(world.historical_items().any(|h| h == c));
    }

    #[test]
    fn test_exploration_counters() {
        let mut world = WorldModel::new(Coord::ORIGIN);
        world.merge(Coord::new(1, 0), TileKind::Item);
        world.merge(Coord::new(2, 0), TileKind::Empty);
        world.merge(Coord::new(1, 0), TileKind::Empty); // re-observation
        assert_eq!(world.observed_tiles(), 3); // spawn + two new
        assert_eq!(world.observed_items(), 1);
    }

    #[test]
    fn test_spawn_is_seeded() {
        let world = WorldModel::new(Coord::ORIGIN);
        assert_eq!(world.tile(Coord::ORIGIN), Some(TileKind::Empty));
        assert_eq!(world.visits(Coord::ORIGIN), 1);
    }

    #[test]
    fn test_known_dead_end() {
        use crate::types::Direction;
        let mut world = WorldModel::new(Coord::ORIGIN);
        let traps = TrapBoard::new();
        let c = Coord::new(0, -1);
        world.merge(c.step(Direction::Left), TileKind::Block);
        world.merge(c.step(Direction::Right), TileKind::Block);
        world.merge(c.step(Direction::Up), TileKind::Block);
        // Entered from below: every other exit is walled.
        assert!(known_dead_end(&world, &traps, c, Direction::Down));
        assert!(!known_dead_end(&world, &traps, c, Direction::Up));
    }
}
