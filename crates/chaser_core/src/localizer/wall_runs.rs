//! Detection of collinear block runs for corner scoring.
//!
//! Two or more observed blocks sharing an x (or y) value form a run. The
//! run's direction names the map side it is hypothesised to sit on; the
//! sign of the shared coordinate usually decides it, and the ambiguous
//! zero case is settled from the surviving origin candidates.

use fxhash::FxHashMap;

use crate::types::{Coord, Direction, MapDims};

/// A line of observed blocks sharing one axis value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallRun {
    /// Which map side this run is hypothesised to belong to.
    pub dir: Direction,
    /// The shared x (for Left/Right) or y (for Up/Down) value.
    pub axis_value: i32,
    /// Number of blocks in the run.
    pub len: usize,
}

/// Group wall observations into runs. Runs shorter than two blocks carry
/// no directional information and are dropped.
pub fn detect_wall_runs(walls: &[Coord], candidates: &[Coord], dims: MapDims) -> Vec<WallRun> {
    let mut by_x: FxHashMap<i32, usize> = FxHashMap::default();
    let mut by_y: FxHashMap<i32, usize> = FxHashMap::default();
    for wall in walls {
        *by_x.entry(wall.x).or_insert(0) += 1;
        *by_y.entry(wall.y).or_insert(0) += 1;
    }

    let mut runs = Vec::new();
    for (&x, &len) in &by_x {
        if len < 2 {
            continue;
        }
        let dir = if x < 0 {
            Direction::Left
        } else if x > 0 {
            Direction::Right
        } else {
            ambiguous_dir(
                candidates.iter().any(|o| o.x == 1),
                candidates.iter().any(|o| o.x == dims.width - 1),
                Direction::Left,
                Direction::Right,
            )
        };
        runs.push(WallRun { dir, axis_value: x, len });
    }
    for (&y, &len) in &by_y {
        if len < 2 {
            continue;
        }
        let dir = if y < 0 {
            Direction::Up
        } else if y > 0 {
            Direction::Down
        } else {
            ambiguous_dir(
                candidates.iter().any(|o| o.y == 1),
                candidates.iter().any(|o| o.y == dims.height - 1),
                Direction::Up,
                Direction::Down,
            )
        };
        runs.push(WallRun { dir, axis_value: y, len });
    }
    runs
}

/// A run through the agent's own row/column could belong to either side;
/// prefer whichever boundary the candidate set still allows.
fn ambiguous_dir(
    near_possible: bool,
    far_possible: bool,
    near: Direction,
    far: Direction,
) -> Direction {
    match (near_possible, far_possible) {
        (true, false) => near,
        (false, true) => far,
        _ => near,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs_require_two_blocks() {
        let dims = MapDims::default();
        let walls = vec![Coord::new(-2, 0), Coord::new(-2, 1), Coord::new(4, 7)];
        let runs = detect_wall_runs(&walls, &[], dims);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0], WallRun { dir: Direction::Left, axis_value: -2, len: 2 });
    }

    #[test]
    fn test_direction_by_sign() {
        let dims = MapDims::default();
        let walls = vec![
            Coord::new(3, -4),
            Coord::new(4, -4),
            Coord::new(5, -4),
            Coord::new(5, 2),
        ];
        let runs = detect_wall_runs(&walls, &[], dims);
        assert!(runs.contains(&WallRun { dir: Direction::Up, axis_value: -4, len: 3 }));
        assert!(runs.contains(&WallRun { dir: Direction::Right, axis_value: 5, len: 2 }));
    }

    #[test]
    fn test_zero_axis_resolved_from_candidates() {
        let dims = MapDims::default();
        let walls = vec![Coord::new(0, 2), Coord::new(0, 5)];
        // Only an origin with x = 1 survives: the run must be a left wall.
        let candidates = vec![Coord::new(1, 3)];
        let runs = detect_wall_runs(&walls, &candidates, dims);
        assert_eq!(runs[0].dir, Direction::Left);

        // Only x = width-1 survives: right wall.
        let candidates = vec![Coord::new(dims.width - 1, 3)];
        let runs = detect_wall_runs(&walls, &candidates, dims);
        assert_eq!(runs[0].dir, Direction::Right);
    }
}
