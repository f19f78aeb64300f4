use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::elo;
use crate::error::SimResult;
use crate::sampler;
use crate::state::{GroupMatch, Teams};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSummary {
    pub recorded: usize,
    pub simulated: usize,
    pub penalties: usize,
}

/// Plays every group fixture in order.
///
/// Every match gets `elo_prob_home` refreshed from the current ratings. Only matches
/// without a recorded result are drawn; those move ratings and award points
/// (3/1/0). Recorded matches are left alone, so a second pass over the same
/// fixtures changes nothing.
pub fn simulate_group_stage<R: Rng + ?Sized>(
    matches: &mut [GroupMatch],
    teams: &mut Teams,
    cfg: &SimConfig,
    rng: &mut R,
) -> SimResult<StageSummary> {
    let mut summary = StageSummary::default();

    for m in matches.iter_mut() {
        let (home, away) = teams.pair_mut(&m.home_team, &m.away_team)?;
        let p_home = elo::win_probability(home.rating, away.rating);
        m.elo_prob_home = Some(p_home);

        if m.result_home.is_some() {
            summary.recorded += 1;
            continue;
        }

        let result = sampler::sample_group_result(p_home, cfg.ternary, rng)?;
        let shift = elo::apply_rating_shift(home, away, result.home_score(), p_home, cfg.elo);
        let (pts_home, pts_away) = result.points();
        home.points += pts_home;
        away.points += pts_away;
        m.result_home = Some(result);
        summary.simulated += 1;

        debug!(
            "group {} {} v {}: p_home={:.3} result={:?} shift={:+.2}",
            m.group.as_deref().unwrap_or("-"),
            m.home_team,
            m.away_team,
            p_home,
            result,
            shift
        );
    }

    info!(
        "group stage: {} recorded, {} simulated",
        summary.recorded, summary.simulated
    );
    Ok(summary)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingRow {
    pub team: String,
    pub points: u32,
    pub rating: f64,
}

/// Group tables ordered by points, then rating, then name. Fixtures without a group
/// label are collected under `""`.
pub fn standings(
    matches: &[GroupMatch],
    teams: &Teams,
) -> SimResult<BTreeMap<String, Vec<StandingRow>>> {
    let mut members: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();
    for m in matches {
        let entry = members
            .entry(m.group.clone().unwrap_or_default())
            .or_default();
        entry.insert(m.home_team.as_str());
        entry.insert(m.away_team.as_str());
    }

    let mut out = BTreeMap::new();
    for (group, names) in members {
        let mut rows = Vec::with_capacity(names.len());
        for name in names {
            let team = teams.get(name)?;
            rows.push(StandingRow {
                team: name.to_string(),
                points: team.points,
                rating: team.rating,
            });
        }
        rows.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then(b.rating.total_cmp(&a.rating))
                .then(a.team.cmp(&b.team))
        });
        out.insert(group, rows);
    }
    Ok(out)
}
