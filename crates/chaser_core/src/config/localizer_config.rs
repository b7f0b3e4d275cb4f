//! Localizer lock thresholds and scoring weights.

use serde::{Deserialize, Serialize};

/// Parameters of the origin-hypothesis elimination machinery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalizerConfig {
    /// Minimum accumulated score before a single axis may lock softly.
    pub axis_lock_threshold: f64,
    /// Required lead over the runner-up score for a soft axis lock.
    pub axis_lock_margin: f64,
    /// Minimum score for a corner hypothesis to lock the full origin.
    pub corner_lock_threshold: f64,
    /// Soft locks are suppressed until this many observations are stored,
    /// to avoid premature locks from sparse evidence.
    pub min_observations_for_soft_lock: usize,
    /// Base weight of a single boundary-wall vote.
    pub wall_vote_base_weight: f64,
    /// Additional vote weight per cell of Chebyshev distance from the
    /// agent (distant blocks are more likely true boundary).
    pub wall_vote_distance_weight: f64,
    /// Evidence score recorded for an opposing-wall axis lock.
    pub opposing_wall_evidence: f64,
    /// Post-lock contradictions tolerated before a full reset.
    pub max_post_lock_contradictions: u32,
    /// Bound on the retained evidence log.
    pub evidence_log_limit: usize,
    /// Fewer stored observations than this counts as the exploration
    /// phase of the game.
    pub exploration_phase_observations: usize,
}

impl Default for LocalizerConfig {
    fn default() -> Self {
        Self {
            axis_lock_threshold: 2.0,
            axis_lock_margin: 1.0,
            corner_lock_threshold: 3.0,
            min_observations_for_soft_lock: 30,
            wall_vote_base_weight: 0.1,
            wall_vote_distance_weight: 0.05,
            opposing_wall_evidence: 5.0,
            max_post_lock_contradictions: 3,
            evidence_log_limit: 64,
            exploration_phase_observations: 50,
        }
    }
}
