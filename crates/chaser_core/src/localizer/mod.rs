//! Self-localization by elimination of absolute-origin hypotheses.
//!
//! The spawn cell could be any cell of the fixed-size map. Every non-block
//! observation eliminates candidates whose implied absolute position falls
//! outside the map; observed blocks feed a soft boundary-vote score; two
//! opposing walls or a verified corner can lock an axis or the whole
//! origin outright. After a lock, incoming observations keep being
//! checked, and a handful of contradictions forces a full
//! reset-and-replay; a recovery mechanism, never a fatal error.

mod wall_runs;

pub use wall_runs::{detect_wall_runs, WallRun};

use fxhash::FxHashMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::LocalizerConfig;
use crate::types::{Coord, Direction, MapDims, TileKind};

/// One of the two map axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

/// What kind of evidence produced a lock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Evidence {
    /// Hard pruning left a single value on this axis.
    HardAxis { axis: Axis, value: i32 },
    /// Boundary votes cleared the threshold and margin.
    ScoredAxis { axis: Axis, value: i32, score: f64, runner_up: f64 },
    /// Walls seen exactly one cell beyond both map edges.
    OpposingWalls { axis: Axis, value: i32, span: i32 },
    /// Two perpendicular wall runs agreed on a corner.
    CornerLock { origin: Coord, score: f64 },
}

/// Evidence log entry, kept for post-mortem of wrong locks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceEntry {
    pub turn: u32,
    pub observation_count: usize,
    pub candidates: usize,
    pub evidence: Evidence,
}

/// A rectangle in the relative frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

/// Origin-hypothesis tracker.
#[derive(Debug, Clone)]
pub struct Localizer {
    dims: MapDims,
    config: LocalizerConfig,
    /// Surviving origin candidates (absolute map cells).
    candidates: Vec<Coord>,
    /// Every observation ever stored, for replay after a reset.
    observations: FxHashMap<Coord, TileKind>,
    axis_x_scores: FxHashMap<i32, f64>,
    axis_y_scores: FxHashMap<i32, f64>,
    confirmed_x: Option<i32>,
    confirmed_y: Option<i32>,
    confirmed_origin: Option<Coord>,
    post_lock_contradictions: u32,
    evidence: Vec<EvidenceEntry>,
    /// Guards the one-shot localization event across resets.
    localization_handled: bool,
    /// One-shot flag consumed by the turn pipeline.
    just_localized: bool,
}

impl Localizer {
    pub fn new(dims: MapDims, config: LocalizerConfig) -> Self {
        Self {
            dims,
            config,
            candidates: dims.all_cells().collect(),
            observations: FxHashMap::default(),
            axis_x_scores: FxHashMap::default(),
            axis_y_scores: FxHashMap::default(),
            confirmed_x: None,
            confirmed_y: None,
            confirmed_origin: None,
            post_lock_contradictions: 0,
            evidence: Vec::new(),
            localization_handled: false,
            just_localized: false,
        }
    }

    #[inline]
    pub fn localized(&self) -> bool {
        self.confirmed_origin.is_some() || self.candidates.len() == 1
    }

    /// The confirmed origin, or the sole surviving candidate.
    pub fn origin(&self) -> Option<Coord> {
        self.confirmed_origin.or_else(|| {
            if self.candidates.len() == 1 {
                Some(self.candidates[0])
            } else {
                None
            }
        })
    }

    #[inline]
    pub fn candidates_count(&self) -> usize {
        self.candidates.len()
    }

    pub fn confirmed_axes(&self) -> (Option<i32>, Option<i32>) {
        (self.confirmed_x, self.confirmed_y)
    }

    pub fn evidence_log(&self) -> &[EvidenceEntry] {
        &self.evidence
    }

    /// Consume the one-shot localization event.
    pub fn take_just_localized(&mut self) -> bool {
        std::mem::take(&mut self.just_localized)
    }

    /// Feed one turn's observations (relative coordinate, tile).
    pub fn update(&mut self, observations: &[(Coord, TileKind)], turn: u32) {
        if self.localized() {
            for &(coord, tile) in observations {
                self.observations.insert(coord, tile);
                self.post_lock_verify(coord, tile, turn);
            }
            return;
        }

        // Phase 1: hard pruning. A walkable or enemy tile must lie inside
        // the map under every surviving candidate.
        for &(coord, tile) in observations {
            self.observations.insert(coord, tile);
            if tile == TileKind::Block {
                continue;
            }
            let dims = self.dims;
            self.candidates
                .retain(|origin| dims.contains(Coord::new(origin.x + coord.x, origin.y + coord.y)));
        }

        // Phase 2: axis-independent hard locks.
        self.apply_axis_constraints(turn);

        // Phase 3: block evidence (opposing walls, boundary votes, corner).
        let walls: Vec<Coord> = self
            .observations
            .iter()
            .filter(|&(_, &tile)| tile == TileKind::Block)
            .map(|(&coord, _)| coord)
            .collect();
        self.apply_wall_soft_constraint(&walls, turn);

        // Phase 4: collapse / contradiction handling.
        self.check_localization(turn);
        self.reset_if_contradiction(turn);
    }

    /// Lock any axis that hard pruning has reduced to a single value.
    fn apply_axis_constraints(&mut self, turn: u32) {
        if self.localized() {
            return;
        }

        if self.confirmed_x.is_none() {
            if let Some(x) = unique_value(self.candidates.iter().map(|o| o.x)) {
                self.confirmed_x = Some(x);
                debug!("x-axis confirmed by hard constraint: ox={x}");
                self.push_evidence(Evidence::HardAxis { axis: Axis::X, value: x }, turn);
            }
        }
        if self.confirmed_y.is_none() {
            if let Some(y) = unique_value(self.candidates.iter().map(|o| o.y)) {
                self.confirmed_y = Some(y);
                debug!("y-axis confirmed by hard constraint: oy={y}");
                self.push_evidence(Evidence::HardAxis { axis: Axis::Y, value: y }, turn);
            }
        }
        self.combine_confirmed_axes("axis intersection");
    }

    /// Apply all block-based evidence. Scores accumulate across turns over
    /// the full stored wall set; the lock thresholds are tuned for that.
    fn apply_wall_soft_constraint(&mut self, walls: &[Coord], turn: u32) {
        if self.localized() || self.candidates.len() <= 1 || walls.is_empty() {
            return;
        }

        self.check_opposing_walls(walls, turn);
        if self.localized() {
            return;
        }

        self.score_boundary_hypotheses(walls);
        self.try_axis_lock_by_score(turn);

        let runs = detect_wall_runs(walls, &self.candidates, self.dims);
        self.check_corner_with_verification(&runs, turn);
    }

    /// Each wall votes for the origins it would imply if it sat exactly on
    /// one of the four map edges. Distant walls vote with more weight.
    fn score_boundary_hypotheses(&mut self, walls: &[Coord]) {
        let w = self.dims.width;
        let h = self.dims.height;
        for wall in walls {
            let distance = wall.chebyshev(Coord::ORIGIN);
            let weight = self.config.wall_vote_base_weight
                + f64::from(distance) * self.config.wall_vote_distance_weight;

            for ox in [-1 - wall.x, w - wall.x] {
                if (0..w).contains(&ox) {
                    *self.axis_x_scores.entry(ox).or_insert(0.0) += weight;
                }
            }
            for oy in [-1 - wall.y, h - wall.y] {
                if (0..h).contains(&oy) {
                    *self.axis_y_scores.entry(oy).or_insert(0.0) += weight;
                }
            }
        }
    }

    /// Lock an axis whose top vote clears the threshold and leads the
    /// runner-up by the margin, once enough observations accumulated.
    fn try_axis_lock_by_score(&mut self, turn: u32) {
        if self.localized()
            || self.observations.len() < self.config.min_observations_for_soft_lock
        {
            return;
        }

        if self.confirmed_x.is_none() {
            if let Some((value, score, runner_up)) = best_scored_value(
                self.candidates.iter().map(|o| o.x),
                &self.axis_x_scores,
                &self.config,
            ) {
                self.confirmed_x = Some(value);
                self.candidates.retain(|o| o.x == value);
                debug!("x-axis locked by score: ox={value} (score={score:.2}, 2nd={runner_up:.2})");
                self.push_evidence(
                    Evidence::ScoredAxis { axis: Axis::X, value, score, runner_up },
                    turn,
                );
            }
        }
        if self.confirmed_y.is_none() {
            if let Some((value, score, runner_up)) = best_scored_value(
                self.candidates.iter().map(|o| o.y),
                &self.axis_y_scores,
                &self.config,
            ) {
                self.confirmed_y = Some(value);
                self.candidates.retain(|o| o.y == value);
                debug!("y-axis locked by score: oy={value} (score={score:.2}, 2nd={runner_up:.2})");
                self.push_evidence(
                    Evidence::ScoredAxis { axis: Axis::Y, value, score, runner_up },
                    turn,
                );
            }
        }
        self.combine_confirmed_axes("axis scores");
    }

    /// The strongest single-turn signal: walls at two values whose span is
    /// exactly one cell beyond both edges pin the axis geometrically, as
    /// long as every stored walkable observation agrees.
    fn check_opposing_walls(&mut self, walls: &[Coord], turn: u32) {
        if walls.is_empty() {
            return;
        }

        let min_x = walls.iter().map(|c| c.x).min().unwrap_or(0);
        let max_x = walls.iter().map(|c| c.x).max().unwrap_or(0);
        let span_x = max_x - min_x;
        if self.confirmed_x.is_none() && span_x == self.dims.width + 1 {
            let target = -1 - min_x;
            if (0..self.dims.width).contains(&target)
                && self.verify_axis_consistency(Axis::X, target)
            {
                self.confirmed_x = Some(target);
                self.candidates.retain(|o| o.x == target);
                debug!("x-axis locked by opposing walls: ox={target} (span={span_x})");
                self.push_evidence(
                    Evidence::OpposingWalls { axis: Axis::X, value: target, span: span_x },
                    turn,
                );
            }
        }

        let min_y = walls.iter().map(|c| c.y).min().unwrap_or(0);
        let max_y = walls.iter().map(|c| c.y).max().unwrap_or(0);
        let span_y = max_y - min_y;
        if self.confirmed_y.is_none() && span_y == self.dims.height + 1 {
            let target = -1 - min_y;
            if (0..self.dims.height).contains(&target)
                && self.verify_axis_consistency(Axis::Y, target)
            {
                self.confirmed_y = Some(target);
                self.candidates.retain(|o| o.y == target);
                debug!("y-axis locked by opposing walls: oy={target} (span={span_y})");
                self.push_evidence(
                    Evidence::OpposingWalls { axis: Axis::Y, value: target, span: span_y },
                    turn,
                );
            }
        }

        self.combine_confirmed_axes("opposing walls");
        self.check_localization(turn);
    }

    /// Whether every stored non-block observation stays inside the map on
    /// `axis` when the origin component is `value`.
    fn verify_axis_consistency(&self, axis: Axis, value: i32) -> bool {
        let limit = match axis {
            Axis::X => self.dims.width,
            Axis::Y => self.dims.height,
        };
        self.observations.iter().all(|(coord, &tile)| {
            if tile == TileKind::Block {
                return true;
            }
            let translated = match axis {
                Axis::X => value + coord.x,
                Axis::Y => value + coord.y,
            };
            (0..limit).contains(&translated)
        })
    }

    /// Whether every stored non-block observation stays inside the map
    /// under candidate `origin`.
    fn verify_full_consistency(&self, origin: Coord) -> bool {
        self.observations.iter().all(|(coord, &tile)| {
            tile == TileKind::Block
                || self.dims.contains(Coord::new(origin.x + coord.x, origin.y + coord.y))
        })
    }

    /// Score the four corner hypotheses from perpendicular wall runs and
    /// lock the full origin when one clears the (higher) corner threshold
    /// and survives the full consistency check.
    fn check_corner_with_verification(&mut self, runs: &[WallRun], turn: u32) {
        if self.localized() {
            return;
        }

        let mut best: Option<(Coord, f64)> = None;
        for h_dir in [Direction::Left, Direction::Right] {
            for v_dir in [Direction::Up, Direction::Down] {
                if let Some(candidate) = self.score_corner(runs, h_dir, v_dir) {
                    if best.map_or(true, |(_, score)| candidate.1 > score) {
                        best = Some(candidate);
                    }
                }
            }
        }

        let Some((origin, score)) = best else { return };
        if score < self.config.corner_lock_threshold {
            return;
        }
        if !self.candidates.contains(&origin) {
            return;
        }
        if !self.verify_full_consistency(origin) {
            return;
        }

        self.confirmed_origin = Some(origin);
        self.confirmed_x = Some(origin.x);
        self.confirmed_y = Some(origin.y);
        self.candidates = vec![origin];
        debug!("corner verified and locked: ({}, {}) score={score:.2}", origin.x, origin.y);
        self.push_evidence(Evidence::CornerLock { origin, score }, turn);
        self.check_localization(turn);
    }

    /// Score one corner hypothesis from the outermost runs on each side.
    fn score_corner(&self, runs: &[WallRun], h_dir: Direction, v_dir: Direction) -> Option<(Coord, f64)> {
        let h_run = runs
            .iter()
            .filter(|r| r.dir == h_dir)
            .min_by_key(|r| if h_dir == Direction::Left { r.axis_value } else { -r.axis_value })?;
        let v_run = runs
            .iter()
            .filter(|r| r.dir == v_dir)
            .min_by_key(|r| if v_dir == Direction::Up { r.axis_value } else { -r.axis_value })?;

        let hx = h_run.axis_value;
        let vy = v_run.axis_value;
        let bound_x = if h_dir == Direction::Left { -1 } else { self.dims.width };
        let bound_y = if v_dir == Direction::Up { -1 } else { self.dims.height };
        let origin = Coord::new(bound_x - hx, bound_y - vy);
        if !self.dims.contains(origin) {
            return None;
        }

        let mut h_score = h_run.len as f64 * 0.5;
        let mut v_score = v_run.len as f64 * 0.5;
        // A run on the wrong side of the agent for its claimed boundary is
        // weak evidence.
        let h_valid = (h_dir == Direction::Left && hx < 0) || (h_dir == Direction::Right && hx > 0);
        let v_valid = (v_dir == Direction::Up && vy < 0) || (v_dir == Direction::Down && vy > 0);
        if !h_valid {
            h_score *= 0.3;
        }
        if !v_valid {
            v_score *= 0.3;
        }

        let mut score = h_score + v_score;
        if h_run.len >= 2 && v_run.len >= 2 {
            score += 1.0;
        }
        if h_run.len >= 3 && v_run.len >= 3 {
            score += 1.0;
        }
        Some((origin, score))
    }

    /// Promote a full axis pair into a confirmed origin.
    fn combine_confirmed_axes(&mut self, source: &str) {
        if self.confirmed_origin.is_none() {
            if let (Some(x), Some(y)) = (self.confirmed_x, self.confirmed_y) {
                let origin = Coord::new(x, y);
                self.confirmed_origin = Some(origin);
                self.candidates = vec![origin];
                debug!("origin confirmed by {source}: ({x}, {y})");
            }
        }
    }

    /// Collapse detection and the one-shot localization event.
    fn check_localization(&mut self, _turn: u32) {
        if self.confirmed_origin.is_none() && self.candidates.len() == 1 {
            let origin = self.candidates[0];
            self.confirmed_origin = Some(origin);
            self.confirmed_x = Some(origin.x);
            self.confirmed_y = Some(origin.y);
            debug!("localized: origin confirmed at ({}, {})", origin.x, origin.y);
        }
        if self.confirmed_origin.is_some() && !self.localization_handled {
            self.localization_handled = true;
            self.just_localized = true;
        }
    }

    /// An emptied candidate set is a pure contradiction; recover with a
    /// full reset-and-replay.
    fn reset_if_contradiction(&mut self, turn: u32) {
        if !self.candidates.is_empty() {
            return;
        }
        warn!("localizer contradiction: all origin candidates eliminated, resetting");
        self.full_reset(turn);
    }

    /// Check one observation against the locked origin. Blocks are exempt
    /// (they may sit inside or outside the map); a few walkable tiles
    /// translated outside the map force a reset.
    fn post_lock_verify(&mut self, coord: Coord, tile: TileKind, turn: u32) {
        let Some(origin) = self.confirmed_origin else { return };
        if tile == TileKind::Block {
            return;
        }
        let abs = Coord::new(origin.x + coord.x, origin.y + coord.y);
        if self.dims.contains(abs) {
            return;
        }

        self.post_lock_contradictions += 1;
        warn!(
            "post-lock contradiction {}/{}: {:?} at relative ({}, {}) maps outside the map",
            self.post_lock_contradictions,
            self.config.max_post_lock_contradictions,
            tile,
            coord.x,
            coord.y
        );
        if self.post_lock_contradictions >= self.config.max_post_lock_contradictions {
            warn!("too many post-lock contradictions, forcing localizer reset");
            self.full_reset(turn);
        }
    }

    /// Clear every belief and replay the stored observations through hard
    /// pruning only. Soft scores restart from zero; the one-shot
    /// localization event is re-armed.
    fn full_reset(&mut self, _turn: u32) {
        self.candidates = self.dims.all_cells().collect();
        self.confirmed_origin = None;
        self.confirmed_x = None;
        self.confirmed_y = None;
        self.axis_x_scores.clear();
        self.axis_y_scores.clear();
        self.evidence.clear();
        self.post_lock_contradictions = 0;
        self.localization_handled = false;
        self.just_localized = false;

        let preserved: Vec<(Coord, TileKind)> =
            self.observations.iter().map(|(&c, &t)| (c, t)).collect();
        self.observations.clear();
        for (coord, tile) in preserved {
            self.observations.insert(coord, tile);
            if tile == TileKind::Block {
                continue;
            }
            let dims = self.dims;
            self.candidates
                .retain(|origin| dims.contains(Coord::new(origin.x + coord.x, origin.y + coord.y)));
        }
        debug!(
            "replayed {} observations, {} candidates remain",
            self.observations.len(),
            self.candidates.len()
        );

        if self.candidates.is_empty() {
            // The stored history itself is inconsistent; drop it rather
            // than reset forever.
            warn!("stored observations are self-contradictory, dropping history");
            self.observations.clear();
            self.candidates = self.dims.all_cells().collect();
        }
    }

    fn push_evidence(&mut self, evidence: Evidence, turn: u32) {
        if self.evidence.len() >= self.config.evidence_log_limit {
            self.evidence.remove(0);
        }
        self.evidence.push(EvidenceEntry {
            turn,
            observation_count: self.observations.len(),
            candidates: self.candidates.len(),
            evidence,
        });
    }

    // ------------------------------------------------------------------
    // Coordinate queries
    // ------------------------------------------------------------------

    /// Relative -> absolute, once an origin is known.
    pub fn to_absolute(&self, rel: Coord) -> Option<Coord> {
        self.origin().map(|o| Coord::new(o.x + rel.x, o.y + rel.y))
    }

    /// Absolute -> relative, once an origin is known.
    pub fn to_relative(&self, abs: Coord) -> Option<Coord> {
        self.origin().map(|o| Coord::new(abs.x - o.x, abs.y - o.y))
    }

    /// Whether `rel` is inside the map under every surviving candidate.
    pub fn definitely_inside(&self, rel: Coord) -> bool {
        !self.candidates.is_empty()
            && self
                .candidates
                .iter()
                .all(|o| self.dims.contains(Coord::new(o.x + rel.x, o.y + rel.y)))
    }

    /// Whether `rel` is outside the map under every surviving candidate.
    pub fn definitely_outside(&self, rel: Coord) -> bool {
        !self.candidates.is_empty()
            && self
                .candidates
                .iter()
                .all(|o| !self.dims.contains(Coord::new(o.x + rel.x, o.y + rel.y)))
    }

    /// The relative-frame rectangle guaranteed inside the map under every
    /// candidate (the intersection).
    pub fn estimated_bounds(&self) -> Option<Bounds> {
        if self.candidates.is_empty() {
            return None;
        }
        Some(Bounds {
            min_x: self.candidates.iter().map(|o| -o.x).max()?,
            max_x: self.candidates.iter().map(|o| self.dims.width - 1 - o.x).min()?,
            min_y: self.candidates.iter().map(|o| -o.y).max()?,
            max_y: self.candidates.iter().map(|o| self.dims.height - 1 - o.y).min()?,
        })
    }

    /// The widest relative-frame rectangle the map could still occupy
    /// (the union over candidates).
    pub fn outer_bounds(&self) -> Option<Bounds> {
        if self.candidates.is_empty() {
            return None;
        }
        Some(Bounds {
            min_x: self.candidates.iter().map(|o| -o.x).min()?,
            max_x: self.candidates.iter().map(|o| self.dims.width - 1 - o.x).max()?,
            min_y: self.candidates.iter().map(|o| -o.y).min()?,
            max_y: self.candidates.iter().map(|o| self.dims.height - 1 - o.y).max()?,
        })
    }

    /// Whether `rel` sits on the map boundary ring itself (only known
    /// once an origin exists).
    pub fn is_edge(&self, rel: Coord) -> bool {
        match self.to_absolute(rel) {
            Some(abs) => {
                abs.x == 0
                    || abs.x == self.dims.width - 1
                    || abs.y == 0
                    || abs.y == self.dims.height - 1
            }
            None => false,
        }
    }

    /// Whether `rel` is within one cell of where the map could end. Uses
    /// the union bounds so only coordinates truly close to a possible
    /// boundary are flagged.
    pub fn near_edge(&self, rel: Coord) -> bool {
        let Some(bounds) = self.outer_bounds().or_else(|| self.estimated_bounds()) else {
            return false;
        };
        rel.x <= bounds.min_x + 1
            || rel.x >= bounds.max_x - 1
            || rel.y <= bounds.min_y + 1
            || rel.y >= bounds.max_y - 1
    }

    /// Early game: too few observations for soft evidence to mean much.
    pub fn exploration_phase(&self) -> bool {
        self.observations.len() < self.config.exploration_phase_observations
    }

    /// The probe direction that would shrink the candidate set fastest:
    /// look along the axis with the larger spread, toward the wider side.
    pub fn best_probe_direction(&self) -> Option<Direction> {
        if self.localized() {
            return None;
        }
        let bounds = self.estimated_bounds()?;
        let x_uncertainty = (bounds.max_x - bounds.min_x).abs();
        let y_uncertainty = (bounds.max_y - bounds.min_y).abs();
        if x_uncertainty > y_uncertainty {
            Some(if bounds.min_x.abs() > bounds.max_x.abs() {
                Direction::Left
            } else {
                Direction::Right
            })
        } else {
            Some(if bounds.min_y.abs() > bounds.max_y.abs() {
                Direction::Up
            } else {
                Direction::Down
            })
        }
    }
}

/// The single distinct value of an iterator, if there is exactly one.
fn unique_value(values: impl Iterator<Item = i32>) -> Option<i32> {
    let mut unique = None;
    for value in values {
        match unique {
            None => unique = Some(value),
            Some(u) if u == value => {}
            Some(_) => return None,
        }
    }
    unique
}

/// Top-scoring candidate value on an axis, with threshold and margin
/// applied. Returns (value, score, runner_up).
fn best_scored_value(
    values: impl Iterator<Item = i32>,
    scores: &FxHashMap<i32, f64>,
    config: &LocalizerConfig,
) -> Option<(i32, f64, f64)> {
    let mut distinct: Vec<i32> = values.collect();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.len() <= 1 {
        return None;
    }

    let mut scored: Vec<(i32, f64)> = distinct
        .into_iter()
        .map(|v| (v, scores.get(&v).copied().unwrap_or(0.0)))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let (best, best_score) = scored[0];
    let runner_up = scored.get(1).map_or(0.0, |&(_, s)| s);
    if best_score >= config.axis_lock_threshold && best_score - runner_up >= config.axis_lock_margin
    {
        Some((best, best_score, runner_up))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn localizer() -> Localizer {
        Localizer::new(MapDims::default(), LocalizerConfig::default())
    }

    fn empties(coords: &[(i32, i32)]) -> Vec<(Coord, TileKind)> {
        coords.iter().map(|&(x, y)| (Coord::new(x, y), TileKind::Empty)).collect()
    }

    #[test]
    fn test_starts_with_every_cell() {
        let loc = localizer();
        assert_eq!(loc.candidates_count(), 15 * 17);
        assert!(!loc.localized());
        assert!(loc.origin().is_none());
    }

    #[test]
    fn test_hard_pruning_shrinks_but_never_drops_truth() {
        let mut loc = localizer();
        // True origin (4, 6): all observations derived from it.
        let true_origin = Coord::new(4, 6);
        let obs = empties(&[(-2, 0), (3, 1), (0, -3), (1, 5)]);
        loc.update(&obs, 1);
        assert!(loc.candidates_count() > 1);
        assert!(loc
            .candidates
            .iter()
            .any(|&o| o == true_origin));
    }

    #[test]
    fn test_no_false_lock_from_empty_wandering() {
        // Forty turns of empty tiles at varied positions that never touch
        // an edge must not confirm an origin.
        let mut loc = localizer();
        for turn in 0..40 {
            let step = (turn % 5) as i32;
            let obs = empties(&[
                (step - 1, step - 1),
                (step, step - 1),
                (step + 1, step - 1),
                (step - 1, step),
                (step, step),
                (step + 1, step),
                (step - 1, step + 1),
                (step, step + 1),
                (step + 1, step + 1),
            ]);
            loc.update(&obs, turn);
        }
        assert!(!loc.localized());
        assert!(loc.candidates_count() > 1);
    }

    #[test]
    fn test_hard_prune_collapse_confirms_and_fires_event() {
        let mut loc = localizer();
        // Empties spanning the full map width pin the x axis; same for y.
        let obs = empties(&[(-3, 0), (11, 0), (0, -6), (0, 10)]);
        loc.update(&obs, 1);
        // ox must be 3 (so -3 maps to 0 and 11 maps to 14); oy must be 6.
        assert!(loc.localized());
        assert_eq!(loc.origin(), Some(Coord::new(3, 6)));
        assert!(loc.take_just_localized());
        // The event is one-shot.
        assert!(!loc.take_just_localized());
    }

    #[test]
    fn test_opposing_wall_lock() {
        // Blocks at relative (-1, 3) and (15, 3): the span equals map
        // width + 1, so the x axis locks at ox = 0.
        let mut loc = localizer();
        let mut obs: Vec<(Coord, TileKind)> = vec![
            (Coord::new(-1, 3), TileKind::Block),
            (Coord::new(15, 3), TileKind::Block),
        ];
        obs.extend(empties(&[(2, 3), (5, 3), (7, 0)]));
        loc.update(&obs, 1);

        let (x, y) = loc.confirmed_axes();
        assert_eq!(x, Some(0));
        assert_eq!(y, None);
        assert!(!loc.localized());
        assert!(loc.candidates.iter().all(|o| o.x == 0));
        assert!(loc
            .evidence_log()
            .iter()
            .any(|e| matches!(e.evidence, Evidence::OpposingWalls { axis: Axis::X, value: 0, .. })));
    }

    #[test]
    fn test_opposing_wall_rejected_on_inconsistency() {
        let mut loc = localizer();
        // Same walls, but a walkable tile at x = -2 contradicts ox = 0.
        let mut obs: Vec<(Coord, TileKind)> = vec![
            (Coord::new(-1, 3), TileKind::Block),
            (Coord::new(15, 3), TileKind::Block),
        ];
        obs.push((Coord::new(-2, 3), TileKind::Empty));
        loc.update(&obs, 1);
        let (x, _) = loc.confirmed_axes();
        assert_eq!(x, None);
    }

    #[test]
    fn test_soft_lock_needs_observation_mass() {
        let mut loc = localizer();
        // A long left wall: strong votes, but too few observations for a
        // soft lock.
        let obs: Vec<(Coord, TileKind)> = (0..8)
            .map(|i| (Coord::new(-3, i - 4), TileKind::Block))
            .collect();
        loc.update(&obs, 1);
        let (x, _) = loc.confirmed_axes();
        assert_eq!(x, None);
    }

    #[test]
    fn test_corner_lock() {
        let mut loc = localizer();
        // First, shrink the candidate set with walkable tiles consistent
        // with origin (2, 3) (absolute frame: map is 15x17).
        let obs = empties(&[(-2, -3), (9, 10), (0, 0)]);
        loc.update(&obs, 1);
        assert!(!loc.localized());

        // A left wall at x = -3 (three blocks) and a top wall at y = -4
        // (three blocks) describe the corner: ox = -1 - (-3) = 2,
        // oy = -1 - (-4) = 3.
        let walls: Vec<(Coord, TileKind)> = vec![
            (Coord::new(-3, -1), TileKind::Block),
            (Coord::new(-3, 0), TileKind::Block),
            (Coord::new(-3, 1), TileKind::Block),
            (Coord::new(-2, -4), TileKind::Block),
            (Coord::new(-1, -4), TileKind::Block),
            (Coord::new(0, -4), TileKind::Block),
        ];
        loc.update(&walls, 2);
        assert!(loc.localized());
        assert_eq!(loc.origin(), Some(Coord::new(2, 3)));
        assert!(loc
            .evidence_log()
            .iter()
            .any(|e| matches!(e.evidence, Evidence::CornerLock { .. })));
    }

    #[test]
    fn test_post_lock_contradictions_force_reset() {
        let mut loc = localizer();
        let obs = empties(&[(-3, 0), (11, 0), (0, -6), (0, 10)]);
        loc.update(&obs, 1);
        assert!(loc.localized());

        // Three walkable observations outside the locked frame.
        for turn in 2..5 {
            loc.update(&[(Coord::new(-5, 0), TileKind::Empty)], turn);
        }
        assert!(!loc.localized());
        // The stored history is self-contradictory ((-3,0) and (11,0) pin
        // ox = 3, (-5,0) demands ox >= 5), so the reset also drops the
        // history and starts from the full candidate set.
        assert_eq!(loc.candidates_count(), 15 * 17);
        assert!(loc.evidence_log().is_empty());
    }

    #[test]
    fn test_bounds_queries() {
        let mut loc = localizer();
        let obs = empties(&[(-3, 0), (11, 0), (0, -6), (0, 10)]);
        loc.update(&obs, 1);
        // Fully localized at (3, 6): both bounds collapse to the map frame.
        let est = loc.estimated_bounds().unwrap();
        let outer = loc.outer_bounds().unwrap();
        assert_eq!(est, outer);
        assert_eq!(est, Bounds { min_x: -3, max_x: 11, min_y: -6, max_y: 10 });
        assert!(loc.definitely_inside(Coord::new(0, 0)));
        assert!(loc.definitely_outside(Coord::new(-4, 0)));
        assert_eq!(loc.to_absolute(Coord::new(0, 0)), Some(Coord::new(3, 6)));
        assert_eq!(loc.to_relative(Coord::new(0, 0)), Some(Coord::new(-3, -6)));
    }

    #[test]
    fn test_best_probe_direction() {
        let mut loc = localizer();
        // Pin y completely; the guaranteed-inside rectangle then spreads
        // along y, and the suggested probe looks toward its wider side.
        let obs = empties(&[(0, -6), (0, 10)]);
        loc.update(&obs, 1);
        assert_eq!(loc.best_probe_direction(), Some(Direction::Down));
        // Once localized there is nothing left to probe for.
        loc.update(&empties(&[(-3, 0), (11, 0)]), 2);
        assert!(loc.localized());
        assert_eq!(loc.best_probe_direction(), None);
    }

    #[test]
    fn test_soundness_under_consistent_observations() {
        // For observations generated from a true origin, the candidate set
        // always contains it and never confirms a different origin.
        let dims = MapDims::default();
        for ox in [0, 3, 7, 14] {
            for oy in [0, 5, 16] {
                let true_origin = Coord::new(ox, oy);
                let mut loc = localizer();
                for turn in 0..20u32 {
                    // Walk a diagonal inside the map and observe empties.
                    let ax = (i32::try_from(turn).unwrap() * 3 + 1) % dims.width;
                    let ay = (i32::try_from(turn).unwrap() * 5 + 2) % dims.height;
                    let rel = Coord::new(ax - ox, ay - oy);
                    loc.update(&[(rel, TileKind::Empty)], turn);
                    assert!(
                        loc.candidates.iter().any(|&c| c == true_origin),
                        "candidate set lost the true origin {true_origin:?}"
                    );
                    if let Some(origin) = loc.origin() {
                        assert_eq!(origin, true_origin);
                    }
                }
            }
        }
    }
}
