//! Risk costs layered on top of the unit step cost.

use crate::config::PathConfig;
use crate::enemy::EnemyBelief;
use crate::types::Coord;

/// Penalty for stepping near the opponent: steep tiers around positions
/// seen this turn, plus a contribution from the belief field at the
/// candidate tile and its neighborhood.
pub fn enemy_proximity_penalty(
    coord: Coord,
    seen: &[Coord],
    belief: &EnemyBelief,
    config: &PathConfig,
) -> f32 {
    let mut penalty = 0.0;

    if let Some(min_dist) = seen.iter().map(|&enemy| coord.manhattan(enemy)).min() {
        penalty += match min_dist {
            0 => config.enemy_contact_penalty,
            1 => config.enemy_distance_penalties[0],
            2 => config.enemy_distance_penalties[1],
            3 => config.enemy_distance_penalties[2],
            _ => 0.0,
        };
    }

    let p = belief.probability(coord);
    if p > config.belief_threshold {
        penalty += p as f32 * config.belief_penalty_gain;
    }

    let neighbor_max = coord
        .neighbors()
        .into_iter()
        .map(|n| belief.probability(n))
        .fold(0.0f64, f64::max);
    if neighbor_max > config.belief_neighbor_threshold {
        penalty += neighbor_max as f32 * config.belief_neighbor_gain;
    }

    penalty
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnemyConfig;

    #[test]
    fn test_seen_enemy_tiers() {
        let config = PathConfig::default();
        let belief = EnemyBelief::new();
        let enemy = vec![Coord::new(5, 5)];
        let at = |x, y| enemy_proximity_penalty(Coord::new(x, y), &enemy, &belief, &config);
        assert_eq!(at(5, 5), 100.0);
        assert_eq!(at(5, 4), 30.0);
        assert_eq!(at(5, 3), 10.0);
        assert_eq!(at(5, 2), 3.0);
        assert_eq!(at(5, 1), 0.0);
    }

    #[test]
    fn test_belief_contribution() {
        let config = PathConfig::default();
        let mut belief = EnemyBelief::new();
        belief.observe_seen(&[Coord::new(3, 3)], 1, Coord::ORIGIN, &EnemyConfig::default());

        // Certainty at the tile: 20.0 from the tile itself; its neighbors
        // see the 5.0-weighted neighborhood term.
        let on_tile = enemy_proximity_penalty(Coord::new(3, 3), &[], &belief, &config);
        assert!((on_tile - 20.0).abs() < 1e-6);
        let beside = enemy_proximity_penalty(Coord::new(3, 4), &[], &belief, &config);
        assert!((beside - 5.0).abs() < 1e-6);
        let far = enemy_proximity_penalty(Coord::new(9, 9), &[], &belief, &config);
        assert_eq!(far, 0.0);
    }
}
