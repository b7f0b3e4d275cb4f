//! Opponent probability field.
//!
//! A direct sighting collapses the field to certainty; every blind turn
//! clears the visible region (a visible-but-unseen cell cannot hold the
//! opponent) and diffuses the remaining mass over walkable neighbors with
//! a decay factor, so stale information evaporates. Before any sighting,
//! the field stays empty until localization succeeds, at which point the
//! fairness rule pins the first hypothesis to the mirror of the spawn.

use std::collections::VecDeque;

use fxhash::{FxHashMap, FxHashSet};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::EnemyConfig;
use crate::types::Coord;

/// One recorded direct sighting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Sighting {
    pub turn: u32,
    pub pos: Coord,
    /// Where the agent stood when it saw the opponent.
    pub my_pos: Coord,
}

/// The belief field plus the sighting history it is conditioned on.
#[derive(Debug, Clone, Default)]
pub struct EnemyBelief {
    field: FxHashMap<Coord, f64>,
    sightings: VecDeque<Sighting>,
    last_known: Option<Coord>,
    /// The one-shot symmetric-spawn seed has been placed.
    seeded: bool,
}

impl EnemyBelief {
    pub fn new() -> Self {
        Self::default()
    }

    /// The opponent is directly visible: collapse to certainty.
    pub fn observe_seen(
        &mut self,
        positions: &[Coord],
        turn: u32,
        my_pos: Coord,
        config: &EnemyConfig,
    ) {
        let Some(&first) = positions.first() else { return };
        self.last_known = Some(first);
        self.sightings.push_back(Sighting { turn, pos: first, my_pos });
        while self.sightings.len() > config.sighting_history_limit {
            self.sightings.pop_front();
        }

        self.field.clear();
        for &pos in positions {
            self.field.insert(pos, 1.0);
        }
    }

    /// No opponent in sight: clear the visible region, then diffuse.
    ///
    /// `seed` is the mirror of the spawn once localization has succeeded;
    /// it is consumed at most once, before the first ever sighting.
    /// `walkable` answers whether belief may flow through a coordinate
    /// (unknown tiles count as open).
    pub fn observe_unseen(
        &mut self,
        visible: &[Coord],
        seed: Option<Coord>,
        walkable: impl Fn(Coord) -> bool,
        config: &EnemyConfig,
    ) {
        let visible: FxHashSet<Coord> = visible.iter().copied().collect();
        for coord in &visible {
            self.field.remove(coord);
        }

        if self.field.is_empty() && self.last_known.is_none() {
            if !self.seeded {
                if let Some(seed) = seed {
                    self.field.insert(seed, 1.0);
                    self.seeded = true;
                    debug!("enemy belief seeded at symmetric spawn ({}, {})", seed.x, seed.y);
                }
            }
            return;
        }

        let mut next: FxHashMap<Coord, f64> = FxHashMap::default();
        for (&coord, &mass) in &self.field {
            if mass <= config.probability_floor {
                continue;
            }
            let neighbors: Vec<Coord> =
                coord.neighbors().into_iter().filter(|&n| walkable(n)).collect();
            let share = mass * config.diffusion_decay / (neighbors.len() + 1) as f64;

            // Mass flowing into the visible region is observably absent
            // and is dropped rather than kept.
            if !visible.contains(&coord) {
                *next.entry(coord).or_insert(0.0) += share;
            }
            for neighbor in neighbors {
                if !visible.contains(&neighbor) {
                    *next.entry(neighbor).or_insert(0.0) += share;
                }
            }
        }
        self.field = next;
    }

    /// Probability mass at a coordinate.
    #[inline]
    pub fn probability(&self, coord: Coord) -> f64 {
        self.field.get(&coord).copied().unwrap_or(0.0)
    }

    /// Best guess of the opponent's current position: a fresh sighting
    /// wins, then the belief argmax, then the last known position.
    pub fn predicted_position(&self, turn: u32, config: &EnemyConfig) -> Option<Coord> {
        let last_known = self.last_known?;
        if let Some(sighting) = self.sightings.back() {
            if turn.saturating_sub(sighting.turn) <= config.recent_sighting_turns {
                return Some(last_known);
            }
        }
        self.field
            .iter()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(&coord, _)| coord)
            .or(Some(last_known))
    }

    /// Whether entering `coord` is safe against both the seen opponent
    /// positions and the belief field.
    pub fn position_safe(&self, coord: Coord, seen: &[Coord], config: &EnemyConfig) -> bool {
        if seen.iter().any(|&enemy| coord.manhattan(enemy) == 1) {
            return false;
        }
        if self.probability(coord) > config.danger_self_threshold {
            return false;
        }
        let mut surrounding = 0.0;
        for neighbor in coord.neighbors() {
            let p = self.probability(neighbor);
            if p > config.danger_neighbor_threshold {
                return false;
            }
            surrounding += p;
        }
        surrounding <= config.danger_surrounding_threshold
    }

    /// Whether the recent sightings show the opponent closing in.
    pub fn approaching(&self) -> bool {
        if self.sightings.len() < 2 {
            return false;
        }
        let recent: Vec<&Sighting> = self.sightings.iter().rev().take(3).collect();
        let newest = recent[0];
        let oldest = recent[recent.len() - 1];
        newest.pos.manhattan(newest.my_pos) < oldest.pos.manhattan(oldest.my_pos)
    }

    /// The dominant movement delta across recent sightings, if three or
    /// more sightings exist and the opponent actually moved.
    pub fn dominant_movement(&self) -> Option<(i32, i32)> {
        if self.sightings.len() < 3 {
            return None;
        }
        let mut counts: FxHashMap<(i32, i32), usize> = FxHashMap::default();
        let positions: Vec<Coord> = self.sightings.iter().map(|s| s.pos).collect();
        for pair in positions.windows(2) {
            let dx = pair[1].x - pair[0].x;
            let dy = pair[1].y - pair[0].y;
            if dx != 0 || dy != 0 {
                *counts.entry((dx.signum(), dy.signum())).or_insert(0) += 1;
            }
        }
        counts.into_iter().max_by_key(|&(_, count)| count).map(|(delta, _)| delta)
    }

    pub fn last_known(&self) -> Option<Coord> {
        self.last_known
    }

    pub fn sightings(&self) -> impl Iterator<Item = &Sighting> {
        self.sightings.iter()
    }

    /// Total probability mass; decays over blind turns, never grows.
    pub fn total_mass(&self) -> f64 {
        self.field.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.field.is_empty()
    }

    pub fn len(&self) -> usize {
        self.field.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config() -> EnemyConfig {
        EnemyConfig::default()
    }

    #[test]
    fn test_sighting_collapses_field() {
        let mut belief = EnemyBelief::new();
        belief.observe_unseen(&[], Some(Coord::new(9, 9)), |_| true, &config());
        assert!((belief.probability(Coord::new(9, 9)) - 1.0).abs() < 1e-9);

        belief.observe_seen(&[Coord::new(2, 3)], 5, Coord::ORIGIN, &config());
        assert!((belief.probability(Coord::new(2, 3)) - 1.0).abs() < 1e-9);
        assert_eq!(belief.probability(Coord::new(9, 9)), 0.0);
        assert_eq!(belief.last_known(), Some(Coord::new(2, 3)));
    }

    #[test]
    fn test_seed_is_one_shot() {
        let mut belief = EnemyBelief::new();
        // Not localized yet: no seed available, field stays empty.
        belief.observe_unseen(&[], None, |_| true, &config());
        assert!(belief.is_empty());

        belief.observe_unseen(&[], Some(Coord::new(9, 9)), |_| true, &config());
        assert!(!belief.is_empty());

        // The seed spike is wiped by vision; it is not re-seeded.
        belief.observe_unseen(&[Coord::new(9, 9)], Some(Coord::new(9, 9)), |_| true, &config());
        assert!(belief.is_empty());
        belief.observe_unseen(&[], Some(Coord::new(9, 9)), |_| true, &config());
        assert!(belief.is_empty());
    }

    #[test]
    fn test_diffusion_spreads_and_decays() {
        let mut belief = EnemyBelief::new();
        belief.observe_seen(&[Coord::new(5, 5)], 1, Coord::ORIGIN, &config());

        belief.observe_unseen(&[], None, |_| true, &config());
        // Spike spreads to itself + 4 neighbors, total mass decays by 0.95.
        assert_eq!(belief.len(), 5);
        assert!((belief.total_mass() - 0.95).abs() < 1e-9);
        let center = belief.probability(Coord::new(5, 5));
        assert!((center - 0.19).abs() < 1e-9);
    }

    #[test]
    fn test_diffusion_respects_walls() {
        let mut belief = EnemyBelief::new();
        belief.observe_seen(&[Coord::new(5, 5)], 1, Coord::ORIGIN, &config());
        // Only the northern neighbor is open.
        let walkable = |c: Coord| c == Coord::new(5, 4);
        belief.observe_unseen(&[], None, walkable, &config());
        assert_eq!(belief.len(), 2);
        assert!((belief.probability(Coord::new(5, 4)) - 0.475).abs() < 1e-9);
        assert!((belief.probability(Coord::new(5, 6))).abs() < 1e-9);
    }

    #[test]
    fn test_visible_region_holds_no_mass() {
        let mut belief = EnemyBelief::new();
        belief.observe_seen(&[Coord::new(5, 5)], 1, Coord::ORIGIN, &config());
        // The agent now sees (5,5) and (5,4) and the opponent is gone.
        let visible = vec![Coord::new(5, 5), Coord::new(5, 4)];
        belief.observe_unseen(&visible, None, |_| true, &config());
        assert_eq!(belief.probability(Coord::new(5, 5)), 0.0);
        assert_eq!(belief.probability(Coord::new(5, 4)), 0.0);
        assert!(belief.is_empty());
    }

    #[test]
    fn test_predicted_position_priorities() {
        let cfg = config();
        let mut belief = EnemyBelief::new();
        assert_eq!(belief.predicted_position(1, &cfg), None);

        belief.observe_seen(&[Coord::new(4, 4)], 10, Coord::ORIGIN, &cfg);
        // Fresh sighting wins.
        assert_eq!(belief.predicted_position(11, &cfg), Some(Coord::new(4, 4)));

        // Sighting goes stale; the argmax of the diffused field wins.
        for _ in 0..3 {
            belief.observe_unseen(&[], None, |_| true, &cfg);
        }
        let predicted = belief.predicted_position(20, &cfg).unwrap();
        assert!(predicted.manhattan(Coord::new(4, 4)) <= 3);
    }

    #[test]
    fn test_approaching() {
        let cfg = config();
        let mut belief = EnemyBelief::new();
        belief.observe_seen(&[Coord::new(8, 0)], 1, Coord::ORIGIN, &cfg);
        belief.observe_seen(&[Coord::new(6, 0)], 2, Coord::ORIGIN, &cfg);
        belief.observe_seen(&[Coord::new(4, 0)], 3, Coord::ORIGIN, &cfg);
        assert!(belief.approaching());
        assert_eq!(belief.dominant_movement(), Some((-1, 0)));
    }

    #[test]
    fn test_position_safe_thresholds() {
        let cfg = config();
        let mut belief = EnemyBelief::new();
        // Adjacent to a seen enemy: never safe.
        assert!(!belief.position_safe(Coord::new(1, 0), &[Coord::new(2, 0)], &cfg));
        assert!(belief.position_safe(Coord::new(1, 0), &[Coord::new(4, 0)], &cfg));

        belief.observe_seen(&[Coord::new(5, 5)], 1, Coord::ORIGIN, &cfg);
        // Certainty at (5,5): the tile and its neighbors are unsafe.
        assert!(!belief.position_safe(Coord::new(5, 5), &[], &cfg));
        assert!(!belief.position_safe(Coord::new(5, 4), &[], &cfg));
        assert!(belief.position_safe(Coord::new(0, 0), &[], &cfg));
    }

    proptest! {
        /// Decay guarantees diffusion never creates probability mass.
        #[test]
        fn prop_diffusion_never_increases_mass(
            cells in proptest::collection::vec(((-8i32..8, -8i32..8), 0.0f64..1.0), 1..20)
        ) {
            let mut belief = EnemyBelief::new();
            belief.last_known = Some(Coord::ORIGIN);
            for ((x, y), mass) in cells {
                *belief.field.entry(Coord::new(x, y)).or_insert(0.0) += mass;
            }
            let before = belief.total_mass();
            belief.observe_unseen(&[], None, |_| true, &config());
            prop_assert!(belief.total_mass() <= before + 1e-9);
        }

        /// The visible region is always empty after a blind update.
        #[test]
        fn prop_visible_region_is_cleared(
            x in -5i32..5, y in -5i32..5
        ) {
            let mut belief = EnemyBelief::new();
            belief.observe_seen(&[Coord::new(0, 0)], 1, Coord::new(2, 2), &config());
            let visible = vec![Coord::new(x, y)];
            belief.observe_unseen(&visible, None, |_| true, &config());
            prop_assert_eq!(belief.probability(Coord::new(x, y)), 0.0);
        }
    }
}
