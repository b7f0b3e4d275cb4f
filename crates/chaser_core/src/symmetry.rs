//! Point-symmetry inference and frontier scoring.
//!
//! The map generator places items point-symmetrically about the map
//! center, so a confirmed origin lets every observed item predict its
//! mirror. Blocks are deliberately not mirrored: the agent's own placed
//! blocks are not part of the generated layout, and a mirrored phantom
//! wall would poison the pathfinder.

use log::debug;

use crate::localizer::Localizer;
use crate::types::{Coord, MapDims, TileKind};
use crate::world::WorldModel;

const PRIORITY_BASE: f64 = 10.0;
const PRIORITY_TRULY_UNKNOWN: f64 = 5.0;
const PRIORITY_NEAR_EDGE: f64 = 3.0;
const PRIORITY_ON_EDGE: f64 = 5.0;
const PRIORITY_CENTER_WEIGHT: f64 = 0.2;
const PRIORITY_UNSEEN_NEIGHBOR: f64 = 0.5;
const PRIORITY_NEIGHBOR_VISIT_WEIGHT: f64 = 0.3;
const FRONTIER_FROM_VISIT_WEIGHT: f64 = 0.8;
const FRONTIER_DISTANCE_WEIGHT: f64 = 0.3;

/// Write the mirror of an observed tile into the world model.
///
/// Fires only when the origin is confirmed, the source is not a
/// self-placed block, and the destination is still unknown: inference
/// never overwrites real knowledge. Only items are mirrored.
///
/// Returns the coordinate written, if any.
pub fn apply_inference(
    world: &mut WorldModel,
    localizer: &Localizer,
    dims: MapDims,
    coord: Coord,
    tile: TileKind,
) -> Option<Coord> {
    if !localizer.localized() {
        return None;
    }
    if tile != TileKind::Item {
        return None;
    }
    if world.is_self_placed(coord) {
        return None;
    }

    let abs = localizer.to_absolute(coord)?;
    let sym_abs = dims.mirror(abs)?;
    let sym_rel = localizer.to_relative(sym_abs)?;
    if world.set_inferred(sym_rel, tile) {
        debug!(
            "inferred item at ({}, {}) from its mirror at ({}, {})",
            sym_rel.x, sym_rel.y, coord.x, coord.y
        );
        Some(sym_rel)
    } else {
        None
    }
}

/// Re-run symmetry inference over everything observed before the origin
/// was known, including items that have since been consumed.
pub fn retroactive_replay(world: &mut WorldModel, localizer: &Localizer, dims: MapDims) -> usize {
    if !localizer.localized() {
        return 0;
    }

    let sources: Vec<Coord> = world
        .iter()
        .filter(|&(coord, tile)| tile == TileKind::Item && !world.is_self_placed(coord))
        .map(|(coord, _)| coord)
        .chain(world.historical_items())
        .collect();

    let mut written = 0;
    for coord in sources {
        if apply_inference(world, localizer, dims, coord, TileKind::Item).is_some() {
            written += 1;
        }
    }
    debug!("retroactive symmetry replay wrote {written} inferred tiles");
    written
}

/// Read-side inference for the pathfinder: what the mirror of an unknown
/// coordinate suggests it holds. Weak evidence only; an inferred empty
/// is an assumption of walkability, never knowledge. Self-placed blocks
/// are excluded as sources, and blocks are never inferred.
pub fn infer_tile(
    world: &WorldModel,
    localizer: &Localizer,
    dims: MapDims,
    coord: Coord,
) -> Option<TileKind> {
    if !localizer.localized() {
        return None;
    }
    let abs = localizer.to_absolute(coord)?;
    let sym_abs = dims.mirror(abs)?;
    let sym_rel = localizer.to_relative(sym_abs)?;
    if world.is_self_placed(sym_rel) {
        return None;
    }
    match world.tile(sym_rel) {
        Some(TileKind::Item) => Some(TileKind::Item),
        Some(TileKind::Empty) => Some(TileKind::Empty),
        _ => None,
    }
}

/// Unknown even after consulting the mirror: worth twice the exploration
/// value of an ordinary unseen tile.
pub fn truly_unknown(
    world: &WorldModel,
    localizer: &Localizer,
    dims: MapDims,
    coord: Coord,
) -> bool {
    if localizer.definitely_outside(coord) {
        return false;
    }
    world.tile(coord).is_none() && infer_tile(world, localizer, dims, coord).is_none()
}

/// Exploration value of a coordinate; higher is better.
pub fn exploration_priority(
    world: &WorldModel,
    localizer: &Localizer,
    dims: MapDims,
    coord: Coord,
) -> f64 {
    if localizer.definitely_outside(coord) {
        return f64::NEG_INFINITY;
    }
    if world.tile(coord).is_some() {
        return 0.0;
    }

    let mut priority = PRIORITY_BASE;
    if truly_unknown(world, localizer, dims, coord) {
        priority += PRIORITY_TRULY_UNKNOWN;
    }
    if localizer.near_edge(coord) {
        priority -= PRIORITY_NEAR_EDGE;
    }
    if localizer.is_edge(coord) {
        priority -= PRIORITY_ON_EDGE;
    }

    // Central tiles open more of the map per step. Before localization
    // the spawn stands in for the center; exploration radiates from it
    // anyway.
    let center_distance = match localizer.to_absolute(coord) {
        Some(abs) => abs.manhattan(dims.center()),
        None => coord.manhattan(Coord::ORIGIN),
    };
    priority -= f64::from(center_distance) * PRIORITY_CENTER_WEIGHT;

    for neighbor in coord.neighbors() {
        match world.tile(neighbor) {
            None => priority += PRIORITY_UNSEEN_NEIGHBOR,
            Some(tile) if tile.is_walkable() => {
                priority -=
                    f64::from(world.visits(neighbor)) * PRIORITY_NEIGHBOR_VISIT_WEIGHT;
            }
            Some(_) => {}
        }
    }
    priority
}

/// A ranked frontier: an unseen tile worth exploring, reached via a known
/// walkable neighbor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frontier {
    /// The unseen tile.
    pub target: Coord,
    /// The walkable tile to route to.
    pub via: Coord,
    pub priority: f64,
}

/// The most promising frontier, discounting approaches through heavily
/// revisited tiles and distant detours.
pub fn best_frontier(
    world: &WorldModel,
    localizer: &Localizer,
    dims: MapDims,
    position: Coord,
) -> Option<Frontier> {
    let mut best: Option<Frontier> = None;
    for (coord, tile) in world.iter() {
        if !tile.is_walkable() {
            continue;
        }
        let from_penalty = f64::from(world.visits(coord)) * FRONTIER_FROM_VISIT_WEIGHT;
        let distance_penalty =
            f64::from(position.manhattan(coord)) * FRONTIER_DISTANCE_WEIGHT;

        for neighbor in coord.neighbors() {
            if localizer.definitely_outside(neighbor) || world.tile(neighbor).is_some() {
                continue;
            }
            let priority = exploration_priority(world, localizer, dims, neighbor)
                - from_penalty
                - distance_penalty;
            if best.map_or(true, |b| priority > b.priority) {
                best = Some(Frontier { target: neighbor, via: coord, priority });
            }
        }
    }
    best
}
