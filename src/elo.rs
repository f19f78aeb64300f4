use serde::{Deserialize, Serialize};

use crate::state::Team;

pub const DEFAULT_K: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EloConfig {
    pub k: f64,
}

impl Default for EloConfig {
    fn default() -> Self {
        Self { k: DEFAULT_K }
    }
}

/// Logistic Elo expectation for `r_a` against `r_b`. No home advantage is applied.
pub fn win_probability(r_a: f64, r_b: f64) -> f64 {
    1.0 / (10.0_f64.powf(-(r_a - r_b) / 400.0) + 1.0)
}

/// Moves `shift = k * (observed - expected)` points from `b` to `a` and returns the shift.
pub fn apply_rating_shift(
    a: &mut Team,
    b: &mut Team,
    observed: f64,
    expected: f64,
    cfg: EloConfig,
) -> f64 {
    let delta = cfg.k * (observed - expected);
    a.rating += delta;
    b.rating -= delta;
    delta
}
