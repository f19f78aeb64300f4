use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SimResult;
use crate::prob::{Outcome, Prob3};

/// Maps a uniform draw onto the `[away, draw, home]` partition of `[0, 1)`.
pub fn outcome_from_draw(probs: Prob3, u: f64) -> Outcome {
    if u < probs.away {
        Outcome::Away
    } else if u < probs.away + probs.draw {
        Outcome::Draw
    } else {
        Outcome::Home
    }
}

fn draw_outcome<R: Rng + ?Sized>(home_prob: f64, ternary: bool, rng: &mut R) -> SimResult<Outcome> {
    let probs = Prob3::for_mode(home_prob, ternary)?;
    let u: f64 = rng.gen_range(0.0..1.0);
    Ok(outcome_from_draw(probs, u))
}

/// One group-stage result from the home-win probability.
pub fn sample_group_result<R: Rng + ?Sized>(
    home_prob: f64,
    ternary: bool,
    rng: &mut R,
) -> SimResult<Outcome> {
    draw_outcome(home_prob, ternary, rng)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnockoutResult {
    pub advances: String,
    pub loses: String,
    // Draw when the match went to penalties; ratings move on this value.
    pub result_home: Outcome,
    pub penalties: bool,
}

/// One knockout result. A drawn match goes to a shootout decided by a fair coin.
pub fn sample_knockout_result<R: Rng + ?Sized>(
    home: &str,
    away: &str,
    home_prob: f64,
    ternary: bool,
    rng: &mut R,
) -> SimResult<KnockoutResult> {
    let outcome = draw_outcome(home_prob, ternary, rng)?;
    let result = match outcome {
        Outcome::Home => KnockoutResult {
            advances: home.to_string(),
            loses: away.to_string(),
            result_home: Outcome::Home,
            penalties: false,
        },
        Outcome::Away => KnockoutResult {
            advances: away.to_string(),
            loses: home.to_string(),
            result_home: Outcome::Away,
            penalties: false,
        },
        Outcome::Draw => {
            let (advances, loses) = if rng.gen_bool(0.5) {
                (away, home)
            } else {
                (home, away)
            };
            KnockoutResult {
                advances: advances.to_string(),
                loses: loses.to_string(),
                result_home: Outcome::Draw,
                penalties: true,
            }
        }
    };
    Ok(result)
}
