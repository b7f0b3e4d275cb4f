//! The owned aggregate of every belief structure, and the per-turn
//! pipeline the surrounding turn loop drives.
//!
//! Control flow each turn: `begin_turn` -> `ingest` (vision) -> optional
//! `ingest_probe` -> planner queries -> the chosen action's outcome fed
//! back through `apply_walk` / `apply_put`. The core performs no I/O and
//! never fails fatally; degraded input degrades the beliefs, nothing
//! else.

use fxhash::FxHashMap;
use log::debug;
use serde::Serialize;

use crate::config::CoreConfig;
use crate::enemy::EnemyBelief;
use crate::error::Result;
use crate::localizer::{Bounds, Localizer};
use crate::path::Navigator;
use crate::symmetry::{self, Frontier};
use crate::types::{Coord, Direction, MapDims, TileKind};
use crate::vision::VisionGrid;
use crate::world::{
    self, SearchCache, TrapBoard, TrapReason, TrapStatus, WorldModel,
};

/// Per-turn memoization; wholesale invalidated when the turn advances.
#[derive(Debug, Default)]
struct TurnCaches {
    turn: u32,
    dead_end: FxHashMap<(Coord, usize), bool>,
    space: FxHashMap<Coord, usize>,
}

impl TurnCaches {
    fn roll_to(&mut self, turn: u32) {
        if self.turn != turn {
            self.turn = turn;
            self.dead_end.clear();
            self.space.clear();
        }
    }
}

/// Debug view of the whole belief state.
#[derive(Debug, Serialize)]
pub struct CoreSnapshot {
    pub turn: u32,
    pub position: Coord,
    pub localized: bool,
    pub origin: Option<Coord>,
    pub origin_candidates: usize,
    pub known_tiles: usize,
    pub observed_items: u32,
    pub items_collected: u32,
    pub confirmed_traps: usize,
    pub enemy_mass: f64,
    pub predicted_enemy: Option<Coord>,
    pub tiles: Vec<(Coord, TileKind)>,
}

/// The agent's world model and planner.
#[derive(Debug)]
pub struct ChaserCore {
    config: CoreConfig,
    dims: MapDims,
    world: WorldModel,
    traps: TrapBoard,
    localizer: Localizer,
    enemy: EnemyBelief,
    search_cache: SearchCache,
    caches: TurnCaches,
    position: Coord,
    turn: u32,
    last_direction: Option<Direction>,
    last_grid: Option<VisionGrid>,
    seen_enemies: Vec<Coord>,
    items_collected: u32,
}

impl ChaserCore {
    pub fn new(config: CoreConfig) -> Result<Self> {
        config.validate()?;
        let dims = config.map;
        Ok(Self {
            localizer: Localizer::new(dims, config.localizer.clone()),
            world: WorldModel::new(Coord::ORIGIN),
            traps: TrapBoard::new(),
            enemy: EnemyBelief::new(),
            search_cache: SearchCache::new(),
            caches: TurnCaches::default(),
            position: Coord::ORIGIN,
            turn: 0,
            last_direction: None,
            last_grid: None,
            seen_enemies: Vec::new(),
            items_collected: 0,
            dims,
            config,
        })
    }

    /// Advance the turn counter and drop every per-turn cache.
    pub fn begin_turn(&mut self) {
        self.turn += 1;
        self.caches.roll_to(self.turn);
    }

    // ------------------------------------------------------------------
    // Ingestion
    // ------------------------------------------------------------------

    /// Feed this turn's 3x3 perception snapshot.
    pub fn ingest(&mut self, grid: &VisionGrid) {
        self.last_grid = Some(*grid);
        let out = world::ingest_vision(
            &mut self.world,
            &mut self.traps,
            &self.config.trap,
            self.position,
            grid,
            self.turn,
        );

        for &(coord, tile) in &out.mirror_sources {
            symmetry::apply_inference(&mut self.world, &self.localizer, self.dims, coord, tile);
        }

        self.localizer.update(&out.observations, self.turn);
        self.handle_localization_event();

        self.seen_enemies = out.seen_enemies.clone();
        if out.seen_enemies.is_empty() {
            let seed = self.symmetric_spawn();
            let world = &self.world;
            self.enemy.observe_unseen(
                &out.visible,
                seed,
                |coord| world.diffusion_walkable(coord),
                &self.config.enemy,
            );
        } else {
            self.enemy
                .observe_seen(&out.seen_enemies, self.turn, self.position, &self.config.enemy);
        }
    }

    /// Feed the result of an active directional probe.
    pub fn ingest_probe(&mut self, direction: Direction, tiles: &[Option<TileKind>]) {
        let out = world::ingest_ray(
            &mut self.world,
            &mut self.traps,
            &mut self.search_cache,
            &self.config.trap,
            self.position,
            direction,
            tiles,
            self.turn,
        );
        self.localizer.update(&out.observations, self.turn);
        self.handle_localization_event();
    }

    /// One-shot backfill after the origin is first confirmed: replay
    /// symmetry inference over the whole history and stamp the boundary
    /// ring.
    fn handle_localization_event(&mut self) {
        if !self.localizer.take_just_localized() {
            return;
        }
        let written = symmetry::retroactive_replay(&mut self.world, &self.localizer, self.dims);
        self.fill_boundary_ring();
        debug!(
            "localization backfill complete: {} mirrored tiles, boundary ring stamped",
            written
        );
    }

    /// Mark the one-cell ring around the map as blocks. Inferred
    /// knowledge: never overwrites an observation.
    fn fill_boundary_ring(&mut self) {
        let (w, h) = (self.dims.width, self.dims.height);
        for ay in [-1, h] {
            for ax in -1..=w {
                self.mark_boundary(Coord::new(ax, ay));
            }
        }
        for ax in [-1, w] {
            for ay in 0..h {
                self.mark_boundary(Coord::new(ax, ay));
            }
        }
    }

    fn mark_boundary(&mut self, abs: Coord) {
        if let Some(rel) = self.localizer.to_relative(abs) {
            self.world.set_inferred(rel, TileKind::Block);
        }
    }

    /// The mirror of the spawn, where the fairness rule placed the
    /// opponent; available once localized.
    fn symmetric_spawn(&self) -> Option<Coord> {
        let abs = self.localizer.to_absolute(Coord::ORIGIN)?;
        let sym = self.dims.mirror(abs)?;
        self.localizer.to_relative(sym)
    }

    // ------------------------------------------------------------------
    // Action feedback
    // ------------------------------------------------------------------

    /// Record the outcome of a walk action.
    pub fn apply_walk(&mut self, direction: Direction, success: bool) {
        if !success {
            return;
        }
        let target = self.position.step(direction);
        if self.world.tile(target) == Some(TileKind::Item) {
            // Picking an item up leaves a block on the vacated tile; that
            // block is the agent's own, not part of the generated layout.
            self.world.mark_self_placed(self.position);
            self.items_collected += 1;
        }
        self.position = target;
        self.world.record_visit(target);
        self.last_direction = Some(direction);
    }

    /// Record the outcome of a put-block action.
    pub fn apply_put(&mut self, direction: Direction, success: bool) {
        if !success {
            return;
        }
        let coord = self.position.step(direction);
        self.world.merge(coord, TileKind::Block);
        self.world.mark_self_placed(coord);
    }

    /// Record that a probe has been issued toward `direction`; the cell
    /// ahead is unenterable until the result arrives.
    pub fn note_probe_issued(&mut self, direction: Direction) {
        self.traps.mark_pending(self.position.step(direction), self.turn);
    }

    /// Whether moving toward an item in `direction` warrants a probe
    /// first. A cached ray that already proves the tile pass-through
    /// settles it for free; otherwise the tile goes into `PendingSearch`
    /// and the caller should issue the probe.
    pub fn should_probe_before_move(&mut self, direction: Direction) -> bool {
        let Some(grid) = self.last_grid else { return false };
        if grid.front(direction) != Some(TileKind::Item) {
            return false;
        }
        let coord = self.position.step(direction);
        let status = self.traps.status(coord);
        if status.is_terminal() || status == TrapStatus::PendingSearch {
            return false;
        }
        let suspected = status == TrapStatus::SuspectedTrap
            || world::walled_item_ahead(&self.world, &self.traps, &grid, self.position, direction);
        if !suspected {
            return false;
        }
        if self
            .search_cache
            .covers_pass_through(coord, direction, self.turn, &self.config.trap)
        {
            self.traps.mark_safe(coord, TrapReason::ProbeCache, self.turn);
            return false;
        }
        self.traps.mark_pending(coord, self.turn);
        true
    }

    // ------------------------------------------------------------------
    // Planner queries
    // ------------------------------------------------------------------

    /// A read-only search view over the current beliefs.
    pub fn navigator(&self) -> Navigator<'_> {
        Navigator {
            world: &self.world,
            traps: &self.traps,
            localizer: &self.localizer,
            enemy: &self.enemy,
            config: &self.config.path,
            trap_config: &self.config.trap,
            dims: self.dims,
            position: self.position,
            last_direction: self.last_direction,
        }
    }

    /// First step toward any coordinate satisfying `goal`, which receives
    /// the coordinate and the core's tile knowledge for it.
    pub fn query<F>(&self, goal: F) -> Option<Direction>
    where
        F: Fn(Coord, Option<TileKind>) -> bool,
    {
        let world = &self.world;
        self.navigator()
            .first_step(|coord| goal(coord, world.tile(coord)), &self.seen_enemies, false)
    }

    /// First step toward a committed point target.
    pub fn query_point(&self, target: Coord) -> Option<Direction> {
        self.navigator().first_step_to(target, &self.seen_enemies, false)
    }

    /// Path cost to a target, if reachable within the node budget.
    pub fn path_cost(&self, target: Coord) -> Option<f32> {
        self.navigator().path_cost(target, &self.seen_enemies)
    }

    /// First step toward the nearest known item.
    pub fn first_step_to_nearest_item(&self, avoid_items: bool) -> Option<Direction> {
        let world = &self.world;
        self.navigator().first_step(
            |coord| world.tile(coord) == Some(TileKind::Item),
            &self.seen_enemies,
            avoid_items,
        )
    }

    /// First step toward unexplored territory: the ranked frontier first,
    /// then any tile adjacent to a truly unknown cell, then any tile
    /// adjacent to an unobserved cell.
    pub fn first_step_to_frontier(&self) -> Option<Direction> {
        let nav = self.navigator();
        let world = &self.world;
        let localizer = &self.localizer;
        let dims = self.dims;

        if let Some(frontier) = self.best_frontier() {
            if let Some(step) = nav.first_step_to(frontier.via, &self.seen_enemies, false) {
                return Some(step);
            }
        }

        nav.first_step(
            |coord| {
                matches!(world.tile(coord), Some(t) if t.is_walkable())
                    && !localizer.definitely_outside(coord)
                    && coord.neighbors().into_iter().any(|n| {
                        !localizer.definitely_outside(n)
                            && symmetry::truly_unknown(world, localizer, dims, n)
                    })
            },
            &self.seen_enemies,
            false,
        )
        .or_else(|| {
            nav.first_step(
                |coord| {
                    matches!(world.tile(coord), Some(t) if t.is_walkable())
                        && !localizer.definitely_outside(coord)
                        && coord
                            .neighbors()
                            .into_iter()
                            .any(|n| !localizer.definitely_outside(n) && world.tile(n).is_none())
                },
                &self.seen_enemies,
                false,
            )
        })
    }

    /// The most promising frontier cell, if any.
    pub fn best_frontier(&self) -> Option<Frontier> {
        symmetry::best_frontier(&self.world, &self.localizer, self.dims, self.position)
    }

    // ------------------------------------------------------------------
    // Safety queries
    // ------------------------------------------------------------------

    /// Whether stepping toward `direction` would walk into a trap, a
    /// pocket, or the opponent's reach.
    pub fn would_trap_on_move(&mut self, direction: Direction) -> bool {
        let next = self.position.step(direction);

        if !self.enemy.position_safe(next, &self.seen_enemies, &self.config.enemy) {
            return true;
        }

        let status = self.traps.status(next);
        if status.blocks_movement() {
            return true;
        }
        if status == TrapStatus::ConfirmedSafe {
            return false;
        }

        if let Some(grid) = self.last_grid {
            if world::walled_item_ahead(&self.world, &self.traps, &grid, self.position, direction)
                && grid.front(direction) != Some(TileKind::Empty)
            {
                return true;
            }
        }

        if world::known_dead_end(&self.world, &self.traps, next, direction.opposite()) {
            return true;
        }
        if self.accessible_space_size(next) <= self.config.trap.move_space_threshold {
            return true;
        }
        self.navigator().free_neighbor_count(next, &[self.position]) == 0
    }

    /// Memoized bounded-BFS dead-end check (see `Navigator::is_dead_end`).
    pub fn is_dead_end(&mut self, coord: Coord, threshold: usize) -> bool {
        self.caches.roll_to(self.turn);
        if let Some(&cached) = self.caches.dead_end.get(&(coord, threshold)) {
            return cached;
        }
        let result = self.navigator().is_dead_end(coord, threshold);
        self.caches.dead_end.insert((coord, threshold), result);
        result
    }

    /// Memoized accessible-space estimate around `coord`.
    pub fn accessible_space_size(&mut self, coord: Coord) -> usize {
        self.caches.roll_to(self.turn);
        if let Some(&cached) = self.caches.space.get(&coord) {
            return cached;
        }
        let result = self.navigator().accessible_space_size(coord);
        self.caches.space.insert(coord, result);
        result
    }

    /// Free orthogonal neighbors of the agent's own tile.
    pub fn free_neighbor_count(&self) -> usize {
        self.navigator().free_neighbor_count(self.position, &[])
    }

    // ------------------------------------------------------------------
    // Knowledge queries
    // ------------------------------------------------------------------

    pub fn tile_knowledge(&self, coord: Coord) -> (Option<TileKind>, TrapStatus) {
        (self.world.tile(coord), self.traps.status(coord))
    }

    #[inline]
    pub fn is_localized(&self) -> bool {
        self.localizer.localized()
    }

    pub fn absolute_of(&self, coord: Coord) -> Option<Coord> {
        self.localizer.to_absolute(coord)
    }

    pub fn relative_of(&self, abs: Coord) -> Option<Coord> {
        self.localizer.to_relative(abs)
    }

    pub fn enemy_probability(&self, coord: Coord) -> f64 {
        self.enemy.probability(coord)
    }

    pub fn predicted_enemy_position(&self) -> Option<Coord> {
        self.enemy.predicted_position(self.turn, &self.config.enemy)
    }

    /// The probe direction that would most help localization.
    pub fn best_probe_direction(&self) -> Option<Direction> {
        self.localizer.best_probe_direction()
    }

    pub fn estimated_bounds(&self) -> Option<Bounds> {
        self.localizer.estimated_bounds()
    }

    pub fn exploration_phase(&self) -> bool {
        self.localizer.exploration_phase()
    }

    pub fn item_density(&self) -> f64 {
        self.world.item_density()
    }

    #[inline]
    pub fn position(&self) -> Coord {
        self.position
    }

    #[inline]
    pub fn turn(&self) -> u32 {
        self.turn
    }

    #[inline]
    pub fn items_collected(&self) -> u32 {
        self.items_collected
    }

    pub fn world(&self) -> &WorldModel {
        &self.world
    }

    pub fn traps(&self) -> &TrapBoard {
        &self.traps
    }

    pub fn localizer(&self) -> &Localizer {
        &self.localizer
    }

    pub fn enemy(&self) -> &EnemyBelief {
        &self.enemy
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// Serialize a debug snapshot of the whole belief state.
    pub fn snapshot_json(&self) -> Result<String> {
        let mut tiles: Vec<(Coord, TileKind)> = self.world.iter().collect();
        tiles.sort_unstable_by_key(|&(coord, _)| coord);
        let snapshot = CoreSnapshot {
            turn: self.turn,
            position: self.position,
            localized: self.is_localized(),
            origin: self.localizer.origin(),
            origin_candidates: self.localizer.candidates_count(),
            known_tiles: self.world.known_count(),
            observed_items: self.world.observed_items(),
            items_collected: self.items_collected,
            confirmed_traps: self.traps.confirmed_trap_count(),
            enemy_mass: self.enemy.total_mass(),
            predicted_enemy: self.predicted_enemy_position(),
            tiles,
        };
        Ok(serde_json::to_string(&snapshot)?)
    }
}
