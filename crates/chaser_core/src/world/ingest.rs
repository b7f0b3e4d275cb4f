//! Observation ingestion and trap classification.
//!
//! Two feeds exist: the passive 3x3 vision snapshot every turn, and the
//! result of an active directional probe. Both merge tiles into the world
//! model; the probe additionally settles a pending trap verdict for the
//! cell directly ahead.

use log::debug;

use crate::config::TrapConfig;
use crate::types::{Coord, Direction, TileKind};
use crate::vision::{VisionGrid, CENTER_INDEX, VISION_OFFSETS};
use crate::world::{known_blocked, ProbeRecord, SearchCache, TrapBoard, TrapReason, TrapStatus, WorldModel};

/// Probe rays never report more than nine cells.
pub const MAX_RAY_LENGTH: usize = 9;

/// Everything a vision snapshot contributed, for the downstream stages of
/// the turn pipeline.
#[derive(Debug, Default)]
pub struct VisionIngest {
    /// All reported (coordinate, tile) pairs; fed to the localizer.
    pub observations: Vec<(Coord, TileKind)>,
    /// Items and non-self-placed blocks; candidate symmetry sources.
    pub mirror_sources: Vec<(Coord, TileKind)>,
    /// Enemies visible this turn (center cell excluded).
    pub seen_enemies: Vec<Coord>,
    /// Every coordinate the snapshot actually reported.
    pub visible: Vec<Coord>,
}

/// Everything a probe ray contributed.
#[derive(Debug, Default)]
pub struct ProbeIngest {
    pub observations: Vec<(Coord, TileKind)>,
    /// Verdict recorded for the cell directly ahead, if any.
    pub verdict: Option<TrapStatus>,
}

/// Merge one 3x3 snapshot into the world model and run the passive trap
/// checks.
pub fn ingest_vision(
    world: &mut WorldModel,
    traps: &mut TrapBoard,
    config: &TrapConfig,
    position: Coord,
    grid: &VisionGrid,
    turn: u32,
) -> VisionIngest {
    let mut out = VisionIngest::default();

    for (index, ((dx, dy), tile)) in grid.iter().enumerate() {
        let Some(tile) = tile else { continue };
        let coord = position.offset(dx, dy);
        world.merge(coord, tile);
        out.observations.push((coord, tile));
        out.visible.push(coord);

        if tile == TileKind::Item
            || (tile == TileKind::Block && !world.is_self_placed(coord))
        {
            out.mirror_sources.push((coord, tile));
        }
        if index != CENTER_INDEX && tile == TileKind::Enemy {
            out.seen_enemies.push(coord);
        }
        // An openly walkable square is escapable and hence never a trap.
        if tile == TileKind::Empty {
            traps.mark_safe(coord, TrapReason::OpenTile, turn);
        }
    }

    for dir in Direction::ALL {
        apply_walled_item_check(world, traps, grid, position, dir, turn);
    }
    mark_walled_item_traps(world, traps, config, turn);

    out
}

/// Passive walled-item heuristic for the cell ahead in `dir`: an item with
/// both forward diagonals blocked is suspected without spending a probe.
/// The suspicion is retracted as soon as the geometry stops holding.
fn apply_walled_item_check(
    world: &mut WorldModel,
    traps: &mut TrapBoard,
    grid: &VisionGrid,
    position: Coord,
    dir: Direction,
    turn: u32,
) {
    let front = position.step(dir);
    if walled_item_ahead(world, traps, grid, position, dir) {
        // A square seen openly empty stays safe even inside the geometry.
        if grid.front(dir) != Some(TileKind::Empty) {
            traps.mark_suspected(front, TrapReason::WalledItem, turn);
        }
    } else if traps.status(front) == TrapStatus::SuspectedTrap
        && traps.reason(front) == Some(TrapReason::WalledItem)
    {
        traps.retract_suspicion(front, TrapReason::WalledItem, turn);
    }
}

/// Whether the cell ahead in `dir` holds an item (per this snapshot or
/// memory) with both forward diagonals blocked.
pub fn walled_item_ahead(
    world: &WorldModel,
    traps: &TrapBoard,
    grid: &VisionGrid,
    position: Coord,
    dir: Direction,
) -> bool {
    let front = position.step(dir);
    let front_is_item =
        grid.front(dir) == Some(TileKind::Item) || world.tile(front) == Some(TileKind::Item);
    if !front_is_item {
        return false;
    }
    VisionGrid::forward_diagonals(dir).into_iter().all(|index| {
        let (dx, dy) = VISION_OFFSETS[index];
        let coord = position.offset(dx, dy);
        matches!(grid.tile(index), Some(TileKind::Block) | Some(TileKind::Enemy))
            || known_blocked(world, traps, coord)
    })
}

/// Map-wide sweep: any known item with enough known-blocked neighbors is
/// a confirmed trap; the opponent only has to seal the one remaining exit.
pub fn mark_walled_item_traps(
    world: &WorldModel,
    traps: &mut TrapBoard,
    config: &TrapConfig,
    turn: u32,
) {
    for coord in world.item_coords() {
        let blocked = coord
            .neighbors()
            .into_iter()
            .filter(|&n| known_blocked(world, traps, n))
            .count();
        if blocked >= config.walled_item_neighbor_threshold {
            if traps.mark_trap(coord, TrapReason::MapWalledItem, turn) {
                debug!("trap confirmed at ({}, {}): walled item on map", coord.x, coord.y);
            }
        }
    }
}

/// Merge a probe ray into the world model, cache it, and settle the trap
/// verdict for the cell directly ahead.
///
/// Malformed rays (empty or overlong) are ignored defensively; the
/// affected coordinates stay unknown.
pub fn ingest_ray(
    world: &mut WorldModel,
    traps: &mut TrapBoard,
    cache: &mut SearchCache,
    config: &TrapConfig,
    position: Coord,
    direction: Direction,
    tiles: &[Option<TileKind>],
    turn: u32,
) -> ProbeIngest {
    let mut out = ProbeIngest::default();
    if tiles.is_empty() || tiles.len() > MAX_RAY_LENGTH {
        debug!(
            "ignoring malformed probe ray: direction {:?}, {} cells",
            direction,
            tiles.len()
        );
        return out;
    }

    let (dx, dy) = direction.delta();
    for (i, &tile) in tiles.iter().enumerate() {
        let Some(tile) = tile else { continue };
        let dist = (i + 1) as i32;
        let coord = position.offset(dx * dist, dy * dist);
        world.merge(coord, tile);
        out.observations.push((coord, tile));
    }

    cache.insert(
        ProbeRecord { turn, origin: position, direction, tiles: tiles.to_vec() },
        turn,
        config,
    );

    out.verdict = analyze_ray(world, traps, config, position, direction, tiles, turn);
    mark_walled_item_traps(world, traps, config, turn);
    out
}

/// Classify the cell one step along `direction` from the ray contents.
///
/// The ray is scanned one cell past the probe window: a wall sealing an
/// open run of at most `probe_window` cells makes the run a pocket, and
/// the pocket is a trap unless a lateral escape exists somewhere along it.
/// A longer open run, or an unknown cell before any wall, is pass-through.
fn analyze_ray(
    world: &WorldModel,
    traps: &mut TrapBoard,
    config: &TrapConfig,
    position: Coord,
    direction: Direction,
    tiles: &[Option<TileKind>],
    turn: u32,
) -> Option<TrapStatus> {
    let front = position.step(direction);
    let (dx, dy) = direction.delta();
    let scan = tiles.len().min(config.probe_window + 1);

    let mut wall_distance = None;
    let mut max_escapes = 0usize;
    for (i, &tile) in tiles.iter().enumerate().take(scan) {
        let Some(tile) = tile else { break };
        let dist = (i + 1) as i32;
        let cell = position.offset(dx * dist, dy * dist);
        match tile {
            TileKind::Block | TileKind::Enemy => {
                wall_distance = Some(dist);
                break;
            }
            _ => {
                max_escapes = max_escapes.max(lateral_escape_count(world, traps, cell, direction));
            }
        }
    }

    let verdict = match wall_distance {
        Some(dist) if max_escapes < config.required_escape_options => {
            traps.mark_trap(front, TrapReason::Probe, turn);
            debug!(
                "trap confirmed at ({}, {}): wall at distance {}, no lateral escape",
                front.x, front.y, dist
            );
            TrapStatus::ConfirmedTrap
        }
        Some(dist) => {
            traps.mark_safe(front, TrapReason::Probe, turn);
            debug!(
                "trap cleared at ({}, {}): escape path beside the wall at distance {}",
                front.x, front.y, dist
            );
            TrapStatus::ConfirmedSafe
        }
        None => {
            traps.mark_safe(front, TrapReason::Probe, turn);
            TrapStatus::ConfirmedSafe
        }
    };
    Some(verdict)
}

/// Open perpendicular exits of `coord`, counted from known tiles only.
fn lateral_escape_count(
    world: &WorldModel,
    traps: &TrapBoard,
    coord: Coord,
    forward: Direction,
) -> usize {
    forward
        .perpendicular()
        .into_iter()
        .filter(|&dir| {
            let neighbor = coord.step(dir);
            if traps.status(neighbor).blocks_search() {
                return false;
            }
            world.tile(neighbor).map_or(false, TileKind::is_walkable)
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TileKind::{Block, Empty, Enemy, Item};

    fn setup() -> (WorldModel, TrapBoard, SearchCache, TrapConfig) {
        (
            WorldModel::new(Coord::ORIGIN),
            TrapBoard::new(),
            SearchCache::new(),
            TrapConfig::default(),
        )
    }

    fn grid_with(cells: &[(usize, TileKind)]) -> VisionGrid {
        let mut tiles = [None; 9];
        for &(index, tile) in cells {
            tiles[index] = Some(tile);
        }
        VisionGrid::from_tiles(tiles)
    }

    #[test]
    fn test_vision_marks_open_tiles_safe() {
        let (mut world, mut traps, _, config) = setup();
        let grid = grid_with(&[(4, Empty), (1, Empty), (5, Item)]);
        let out = ingest_vision(&mut world, &mut traps, &config, Coord::ORIGIN, &grid, 1);
        assert_eq!(traps.status(Coord::new(0, -1)), TrapStatus::ConfirmedSafe);
        assert_eq!(traps.status(Coord::new(1, 0)), TrapStatus::Unknown);
        assert_eq!(out.observations.len(), 3);
        assert_eq!(out.mirror_sources, vec![(Coord::new(1, 0), Item)]);
    }

    #[test]
    fn test_walled_item_becomes_suspected_not_confirmed() {
        let (mut world, mut traps, _, config) = setup();
        // Item ahead (up), both forward diagonals blocked.
        let grid = grid_with(&[(4, Empty), (1, Item), (0, Block), (2, Block)]);
        ingest_vision(&mut world, &mut traps, &config, Coord::ORIGIN, &grid, 1);
        assert_eq!(traps.status(Coord::new(0, -1)), TrapStatus::SuspectedTrap);
        assert_eq!(traps.reason(Coord::new(0, -1)), Some(TrapReason::WalledItem));
    }

    #[test]
    fn test_walled_item_retracted_when_front_seen_empty() {
        let (mut world, mut traps, _, config) = setup();
        let walled = grid_with(&[(4, Empty), (1, Item), (0, Block), (2, Block)]);
        ingest_vision(&mut world, &mut traps, &config, Coord::ORIGIN, &walled, 1);
        assert_eq!(traps.status(Coord::new(0, -1)), TrapStatus::SuspectedTrap);

        // The item is consumed: the front tile is now observed empty.
        let front_empty = grid_with(&[(4, Empty), (1, Empty), (0, Block), (2, Block)]);
        ingest_vision(&mut world, &mut traps, &config, Coord::ORIGIN, &front_empty, 2);
        assert_eq!(traps.status(Coord::new(0, -1)), TrapStatus::ConfirmedSafe);
    }

    #[test]
    fn test_map_walled_item_sweep() {
        let (mut world, mut traps, _, config) = setup();
        let item = Coord::new(3, 3);
        world.merge(item, Item);
        world.merge(item.step(Direction::Up), Block);
        world.merge(item.step(Direction::Left), Block);
        world.merge(item.step(Direction::Right), Block);
        mark_walled_item_traps(&world, &mut traps, &config, 1);
        assert_eq!(traps.status(item), TrapStatus::ConfirmedTrap);
        assert_eq!(traps.reason(item), Some(TrapReason::MapWalledItem));
    }

    #[test]
    fn test_probe_dead_end_confirms_trap() {
        // Probe up: three open cells, wall at distance 4, no lateral
        // escape known anywhere along the run. A sealable pocket.
        let (mut world, mut traps, mut cache, config) = setup();
        let tiles = vec![Some(Empty), Some(Empty), Some(Empty), Some(Block), None, None];
        let out = ingest_ray(
            &mut world,
            &mut traps,
            &mut cache,
            &config,
            Coord::ORIGIN,
            Direction::Up,
            &tiles,
            1,
        );
        assert_eq!(out.verdict, Some(TrapStatus::ConfirmedTrap));
        assert_eq!(traps.status(Coord::new(0, -1)), TrapStatus::ConfirmedTrap);
    }

    #[test]
    fn test_probe_with_lateral_escape_is_safe() {
        let (mut world, mut traps, mut cache, config) = setup();
        // A known open cell beside the run provides an escape.
        world.merge(Coord::new(1, -2), Empty);
        let tiles = vec![Some(Empty), Some(Empty), Some(Block)];
        let out = ingest_ray(
            &mut world,
            &mut traps,
            &mut cache,
            &config,
            Coord::ORIGIN,
            Direction::Up,
            &tiles,
            1,
        );
        assert_eq!(out.verdict, Some(TrapStatus::ConfirmedSafe));
        assert_eq!(traps.status(Coord::new(0, -1)), TrapStatus::ConfirmedSafe);
    }

    #[test]
    fn test_probe_pass_through_is_safe() {
        let (mut world, mut traps, mut cache, config) = setup();
        // Open all the way past the window: not a pocket.
        let tiles = vec![Some(Empty); 6];
        let out = ingest_ray(
            &mut world,
            &mut traps,
            &mut cache,
            &config,
            Coord::ORIGIN,
            Direction::Right,
            &tiles,
            1,
        );
        assert_eq!(out.verdict, Some(TrapStatus::ConfirmedSafe));
        assert_eq!(world.tile(Coord::new(6, 0)), Some(Empty));
    }

    #[test]
    fn test_probe_clears_pending() {
        let (mut world, mut traps, mut cache, config) = setup();
        traps.mark_pending(Coord::new(0, 1), 1);
        let tiles = vec![Some(Empty), Some(Empty), Some(Empty), Some(Empty)];
        ingest_ray(
            &mut world,
            &mut traps,
            &mut cache,
            &config,
            Coord::ORIGIN,
            Direction::Down,
            &tiles,
            2,
        );
        assert_eq!(traps.status(Coord::new(0, 1)), TrapStatus::ConfirmedSafe);
    }

    #[test]
    fn test_malformed_ray_is_ignored() {
        let (mut world, mut traps, mut cache, config) = setup();
        let overlong = vec![Some(Empty); 12];
        let out = ingest_ray(
            &mut world,
            &mut traps,
            &mut cache,
            &config,
            Coord::ORIGIN,
            Direction::Up,
            &overlong,
            1,
        );
        assert!(out.observations.is_empty());
        assert!(out.verdict.is_none());
        assert_eq!(world.tile(Coord::new(0, -1)), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_probe_enemy_counts_as_wall() {
        let (mut world, mut traps, mut cache, config) = setup();
        let tiles = vec![Some(Empty), Some(Enemy)];
        let out = ingest_ray(
            &mut world,
            &mut traps,
            &mut cache,
            &config,
            Coord::ORIGIN,
            Direction::Left,
            &tiles,
            1,
        );
        assert_eq!(out.verdict, Some(TrapStatus::ConfirmedTrap));
    }
}
