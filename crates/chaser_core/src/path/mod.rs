//! Cost-aware A* over the world model.
//!
//! The search never needs the whole path: the caller executes one action
//! per turn, so only the first step direction is reconstructed. Goals are
//! arbitrary predicates, which lets one engine serve "nearest item", "any
//! frontier cell" and "this committed target" alike. A node-expansion
//! ceiling bounds the per-turn latency; running into it reports "no path"
//! and the caller picks a fallback.

mod cost;

pub use cost::enemy_proximity_penalty;

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use fxhash::{FxHashMap, FxHashSet};

use crate::config::{PathConfig, TrapConfig};
use crate::enemy::EnemyBelief;
use crate::localizer::Localizer;
use crate::symmetry;
use crate::types::{Coord, Direction, MapDims, TileKind};
use crate::world::{TrapBoard, WorldModel};

/// Read-only view over the belief structures the search consumes.
pub struct Navigator<'a> {
    pub world: &'a WorldModel,
    pub traps: &'a TrapBoard,
    pub localizer: &'a Localizer,
    pub enemy: &'a EnemyBelief,
    pub config: &'a PathConfig,
    pub trap_config: &'a TrapConfig,
    pub dims: MapDims,
    pub position: Coord,
    pub last_direction: Option<Direction>,
}

/// Heuristic guiding the search.
enum Heuristic {
    /// Dijkstra-like; used for predicate goals with no known items.
    Zero,
    /// Manhattan distance to a committed point target.
    Point(Coord),
    /// Half the distance to the nearest known item; keeps predicate
    /// searches loosely goal-directed without over-committing.
    NearestItem(Vec<Coord>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct OpenNode {
    f: f32,
    seq: u64,
    coord: Coord,
}

impl Eq for OpenNode {}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap, we need the smallest f.
        other
            .f
            .partial_cmp(&self.f)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<'a> Navigator<'a> {
    /// Search-level passability.
    ///
    /// Hard knowledge prunes: blocks, standing enemies, confirmed traps,
    /// pending probes and provably-out-of-map cells. Unknown tiles are
    /// optimistically open unless the mirror says otherwise or they hug a
    /// possible boundary.
    pub fn walkable(&self, coord: Coord) -> bool {
        if self.localizer.definitely_outside(coord) {
            return false;
        }
        match self.world.tile(coord) {
            None => match symmetry::infer_tile(self.world, self.localizer, self.dims, coord) {
                Some(TileKind::Block) => false,
                Some(TileKind::Empty) => true,
                _ => !self.localizer.near_edge(coord),
            },
            Some(TileKind::Block) | Some(TileKind::Enemy) => false,
            Some(_) => !self.traps.status(coord).blocks_search(),
        }
    }

    /// First step toward any coordinate satisfying `goal`.
    pub fn first_step<F>(&self, goal: F, seen_enemies: &[Coord], avoid_items: bool) -> Option<Direction>
    where
        F: Fn(Coord) -> bool,
    {
        let items = self.world.item_coords();
        let heuristic = if items.is_empty() {
            Heuristic::Zero
        } else {
            Heuristic::NearestItem(items)
        };
        self.run(goal, heuristic, seen_enemies, avoid_items, false)
            .and_then(|(step, _)| step)
    }

    /// First step toward a committed point target.
    pub fn first_step_to(
        &self,
        target: Coord,
        seen_enemies: &[Coord],
        avoid_items: bool,
    ) -> Option<Direction> {
        self.run(
            |coord| coord == target,
            Heuristic::Point(target),
            seen_enemies,
            avoid_items,
            false,
        )
        .and_then(|(step, _)| step)
    }

    /// Accumulated path cost to `target`, if reachable within budget.
    pub fn path_cost(&self, target: Coord, seen_enemies: &[Coord]) -> Option<f32> {
        if self.world.tile(target) == Some(TileKind::Block) {
            return None;
        }
        self.run(
            |coord| coord == target,
            Heuristic::Point(target),
            seen_enemies,
            false,
            true,
        )
        .map(|(_, cost)| cost)
    }

    fn run<F>(
        &self,
        goal: F,
        heuristic: Heuristic,
        seen_enemies: &[Coord],
        avoid_items: bool,
        goal_may_be_start: bool,
    ) -> Option<(Option<Direction>, f32)>
    where
        F: Fn(Coord) -> bool,
    {
        let start = self.position;
        let mut open = BinaryHeap::new();
        let mut g_score: FxHashMap<Coord, f32> = FxHashMap::default();
        let mut came_from: FxHashMap<Coord, (Coord, Direction)> = FxHashMap::default();
        let mut direction_at: FxHashMap<Coord, Direction> = FxHashMap::default();
        let mut closed: FxHashSet<Coord> = FxHashSet::default();
        let mut seq = 0u64;

        g_score.insert(start, 0.0);
        if let Some(dir) = self.last_direction {
            direction_at.insert(start, dir);
        }
        open.push(OpenNode { f: 0.0, seq, coord: start });

        let mut expansions = 0usize;
        while let Some(OpenNode { coord: current, .. }) = open.pop() {
            expansions += 1;
            if expansions > self.config.node_budget {
                return None;
            }
            if !closed.insert(current) {
                continue;
            }

            if (current != start || goal_may_be_start) && goal(current) {
                let cost = g_score.get(&current).copied().unwrap_or(0.0);
                return Some((reconstruct_first_step(&came_from, start, current), cost));
            }

            let current_g = g_score.get(&current).copied().unwrap_or(f32::INFINITY);
            let current_dir = direction_at.get(&current).copied();

            for dir in Direction::ALL {
                let neighbor = current.step(dir);
                if closed.contains(&neighbor) || !self.walkable(neighbor) {
                    continue;
                }

                let mut step_cost = 1.0;
                step_cost += enemy_proximity_penalty(neighbor, seen_enemies, self.enemy, self.config);
                step_cost += self.world.visits(neighbor) as f32 * self.config.revisit_penalty;
                if avoid_items
                    && self.world.tile(neighbor) == Some(TileKind::Item)
                    && !goal(neighbor)
                {
                    step_cost += self.config.item_detour_penalty;
                }
                if let Some(prev) = current_dir {
                    if prev != dir {
                        step_cost += self.config.turn_penalty;
                    }
                }

                let tentative = current_g + step_cost;
                if tentative < g_score.get(&neighbor).copied().unwrap_or(f32::INFINITY) {
                    g_score.insert(neighbor, tentative);
                    came_from.insert(neighbor, (current, dir));
                    direction_at.insert(neighbor, dir);
                    let h = self.heuristic_value(&heuristic, neighbor);
                    seq += 1;
                    open.push(OpenNode { f: tentative + h, seq, coord: neighbor });
                }
            }
        }
        None
    }

    fn heuristic_value(&self, heuristic: &Heuristic, coord: Coord) -> f32 {
        match heuristic {
            Heuristic::Zero => 0.0,
            Heuristic::Point(target) => coord.manhattan(*target) as f32,
            Heuristic::NearestItem(items) => {
                let nearest = items.iter().map(|&item| coord.manhattan(item)).min();
                nearest.map_or(0.0, |d| d as f32 * self.config.heuristic_item_weight)
            }
        }
    }

    // ------------------------------------------------------------------
    // Reachability
    // ------------------------------------------------------------------

    /// Bounded BFS count of cells reachable from `start`, optionally
    /// pretending `exclude` is blocked.
    pub fn count_reachable(&self, start: Coord, limit: usize, exclude: Option<Coord>) -> usize {
        let mut visited: FxHashSet<Coord> = FxHashSet::default();
        let mut queue = std::collections::VecDeque::new();
        visited.insert(start);
        if let Some(excluded) = exclude {
            visited.insert(excluded);
        }
        queue.push_back(start);

        let mut count = 0;
        while let Some(current) = queue.pop_front() {
            count += 1;
            if count >= limit {
                return count;
            }
            for dir in Direction::ALL {
                let neighbor = current.step(dir);
                if visited.contains(&neighbor) || !self.walkable(neighbor) {
                    continue;
                }
                visited.insert(neighbor);
                queue.push_back(neighbor);
            }
        }
        count
    }

    /// Whether `coord` leads into a pocket: with the agent's current tile
    /// treated as sealed (it cannot step back through the opponent), at
    /// most `threshold` cells remain reachable.
    pub fn is_dead_end(&self, coord: Coord, threshold: usize) -> bool {
        let reachable = self.count_reachable(coord, threshold + 1, Some(self.position));
        reachable <= threshold
    }

    /// Loose BFS estimate of the open space around `start`, capped at the
    /// configured limit. Unknown tiles count as open; suspected traps do
    /// not.
    pub fn accessible_space_size(&self, start: Coord) -> usize {
        let limit = self.trap_config.space_size_limit;
        let mut visited: FxHashSet<Coord> = FxHashSet::default();
        let mut queue = std::collections::VecDeque::new();
        visited.insert(start);
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            if visited.len() > limit {
                return visited.len();
            }
            for dir in Direction::ALL {
                let neighbor = current.step(dir);
                if visited.contains(&neighbor) || !self.space_walkable(neighbor) {
                    continue;
                }
                visited.insert(neighbor);
                queue.push_back(neighbor);
            }
        }
        visited.len()
    }

    fn space_walkable(&self, coord: Coord) -> bool {
        if self.traps.status(coord).blocks_movement() {
            return false;
        }
        !matches!(self.world.tile(coord), Some(TileKind::Block) | Some(TileKind::Enemy))
    }

    /// Free orthogonal neighbors of `position`, skipping `excluded`
    /// coordinates. Unknown tiles count as free.
    pub fn free_neighbor_count(&self, position: Coord, excluded: &[Coord]) -> usize {
        Direction::ALL
            .into_iter()
            .filter(|&dir| {
                let coord = position.step(dir);
                if excluded.contains(&coord) {
                    return false;
                }
                if self.traps.status(coord).blocks_movement() {
                    return false;
                }
                !matches!(self.world.tile(coord), Some(TileKind::Block) | Some(TileKind::Enemy))
            })
            .count()
    }
}

fn reconstruct_first_step(
    came_from: &FxHashMap<Coord, (Coord, Direction)>,
    start: Coord,
    goal: Coord,
) -> Option<Direction> {
    let mut current = goal;
    let mut first = None;
    while let Some(&(parent, dir)) = came_from.get(&current) {
        first = Some(dir);
        current = parent;
        if current == start {
            break;
        }
    }
    first
}
