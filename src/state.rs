use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::prob::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Team {
    pub rating: f64,
    // Group-stage standings only.
    pub points: u32,
}

impl Team {
    pub fn new(rating: f64) -> Self {
        Self { rating, points: 0 }
    }
}

/// Team table keyed by team name. Both stage simulators read and write it in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Teams {
    inner: HashMap<String, Team>,
}

impl Teams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, team: Team) -> Option<Team> {
        self.inner.insert(id.into(), team)
    }

    pub fn get(&self, id: &str) -> SimResult<&Team> {
        self.inner
            .get(id)
            .ok_or_else(|| SimError::UnknownTeam(id.to_string()))
    }

    pub fn rating(&self, id: &str) -> SimResult<f64> {
        self.get(id).map(|t| t.rating)
    }

    /// Mutable access to both sides of a fixture at once.
    pub fn pair_mut(&mut self, home: &str, away: &str) -> SimResult<(&mut Team, &mut Team)> {
        if home == away {
            return Err(SimError::SameTeam(home.to_string()));
        }
        // Distinct keys, so the disjoint lookup cannot panic.
        match self.inner.get_disjoint_mut([home, away]) {
            [Some(h), Some(a)] => Ok((h, a)),
            [None, _] => Err(SimError::UnknownTeam(home.to_string())),
            [_, None] => Err(SimError::UnknownTeam(away.to_string())),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Team)> {
        self.inner.iter()
    }

    /// Team names in sorted order, for stable reporting.
    pub fn sorted_ids(&self) -> Vec<String> {
        let mut ids = self.inner.keys().cloned().collect::<Vec<_>>();
        ids.sort();
        ids
    }
}

impl FromIterator<(String, Team)> for Teams {
    fn from_iter<I: IntoIterator<Item = (String, Team)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMatch {
    #[serde(default)]
    pub group: Option<String>,
    pub home_team: String,
    pub away_team: String,
    // None until the match is played or simulated.
    #[serde(default)]
    pub result_home: Option<Outcome>,
    #[serde(default)]
    pub elo_prob_home: Option<f64>,
}

impl GroupMatch {
    pub fn new(home: impl Into<String>, away: impl Into<String>) -> Self {
        Self {
            group: None,
            home_team: home.into(),
            away_team: away.into(),
            result_home: None,
            elo_prob_home: None,
        }
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_result(mut self, result: Outcome) -> Self {
        self.result_home = Some(result);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KnockoutMatch {
    // Slots stay empty until an earlier match feeds them.
    #[serde(default)]
    pub home_team: Option<String>,
    #[serde(default)]
    pub away_team: Option<String>,
    #[serde(default)]
    pub result_home: Option<Outcome>,
    #[serde(default)]
    pub elo_prob_home: Option<f64>,
    #[serde(default)]
    pub advances: Option<String>,
    #[serde(default)]
    pub loses: Option<String>,
    #[serde(default)]
    pub penalties: bool,
    // None for the final and the third-place match.
    #[serde(default)]
    pub to_match: Option<usize>,
}

impl KnockoutMatch {
    /// Match whose participants come from earlier rounds.
    pub fn pending(to_match: Option<usize>) -> Self {
        Self {
            to_match,
            ..Self::default()
        }
    }

    pub fn between(
        home: impl Into<String>,
        away: impl Into<String>,
        to_match: Option<usize>,
    ) -> Self {
        Self {
            home_team: Some(home.into()),
            away_team: Some(away.into()),
            to_match,
            ..Self::default()
        }
    }

    /// Records a real result. `result_home` is the score before any shootout.
    pub fn with_result(
        mut self,
        advances: impl Into<String>,
        loses: impl Into<String>,
        result_home: Outcome,
        penalties: bool,
    ) -> Self {
        self.advances = Some(advances.into());
        self.loses = Some(loses.into());
        self.result_home = Some(result_home);
        self.penalties = penalties;
        self
    }

    pub fn is_resolved(&self) -> bool {
        self.advances.is_some() && self.loses.is_some()
    }

    pub fn involves(&self, team: &str) -> bool {
        self.home_team.as_deref() == Some(team) || self.away_team.as_deref() == Some(team)
    }
}
