use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

impl Outcome {
    /// Score credited to the home side: 1, 0.5 or 0.
    pub fn home_score(self) -> f64 {
        match self {
            Outcome::Home => 1.0,
            Outcome::Draw => 0.5,
            Outcome::Away => 0.0,
        }
    }

    pub fn from_home_score(score: f64) -> Option<Self> {
        if score == 1.0 {
            Some(Outcome::Home)
        } else if score == 0.5 {
            Some(Outcome::Draw)
        } else if score == 0.0 {
            Some(Outcome::Away)
        } else {
            None
        }
    }

    /// Group standings points as (home, away).
    pub fn points(self) -> (u32, u32) {
        match self {
            Outcome::Home => (3, 0),
            Outcome::Draw => (1, 1),
            Outcome::Away => (0, 3),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prob3 {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl Prob3 {
    pub fn uniform() -> Self {
        Self {
            home: 1.0 / 3.0,
            draw: 1.0 / 3.0,
            away: 1.0 / 3.0,
        }
    }

    /// Spreads a binary home-win probability over home/draw/away.
    ///
    /// At even strength every outcome is equally likely. As the mismatch grows the
    /// draw share shrinks, and the favourite gains faster than the underdog loses.
    pub fn ternary(home: f64) -> SimResult<Self> {
        check_range(home)?;
        if home == 0.0 {
            return Ok(Self {
                home: 0.0,
                draw: 0.0,
                away: 1.0,
            });
        }
        if home == 1.0 {
            return Ok(Self {
                home: 1.0,
                draw: 0.0,
                away: 0.0,
            });
        }

        let away = 1.0 - home;
        let home_odds = home / away;
        let draw_odds = 1.0;
        // Equals 1 - |home - 0.5| * 2 without the cancellation near 0 and 1.
        let away_odds = 2.0 * home.min(away);

        // Rescale against the largest term so nothing overflows; proportions are unchanged.
        let ceiling = home_odds.max(draw_odds).max(away_odds);
        let home_odds = home_odds / ceiling;
        let draw_odds = draw_odds / ceiling;
        let away_odds = away_odds / ceiling;

        let sum = home_odds + draw_odds + away_odds;
        let probs = Self {
            home: home_odds / sum,
            draw: draw_odds / sum,
            away: away_odds / sum,
        };
        if [probs.home, probs.draw, probs.away]
            .iter()
            .all(|p| (0.0..=1.0).contains(p))
        {
            Ok(probs)
        } else {
            Err(SimError::InvalidProbability(home))
        }
    }

    /// No-draw distribution: the binary probability is used as is.
    pub fn binary(home: f64) -> SimResult<Self> {
        check_range(home)?;
        Ok(Self {
            home,
            draw: 0.0,
            away: 1.0 - home,
        })
    }

    pub fn for_mode(home: f64, ternary: bool) -> SimResult<Self> {
        if ternary {
            Self::ternary(home)
        } else {
            Self::binary(home)
        }
    }

    pub fn sum(&self) -> f64 {
        self.home + self.draw + self.away
    }
}

fn check_range(p: f64) -> SimResult<()> {
    // NaN fails `contains` as well.
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(SimError::InvalidProbability(p))
    }
}
