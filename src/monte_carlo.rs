use std::collections::BTreeMap;

use log::info;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::Serialize;

use crate::bracket::Bracket;
use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::finish::{Finish, classify_finish};
use crate::group::simulate_group_stage;
use crate::knockout::simulate_knockout_stage;
use crate::state::{GroupMatch, Teams};

/// Everything one simulation run mutates.
#[derive(Debug, Clone)]
pub struct Tournament {
    pub teams: Teams,
    pub groups: Vec<GroupMatch>,
    pub bracket: Bracket,
}

impl Tournament {
    pub fn new(teams: Teams, groups: Vec<GroupMatch>, bracket: Bracket) -> Self {
        Self {
            teams,
            groups,
            bracket,
        }
    }

    /// Group stage then knockout stage, in place.
    pub fn simulate<R: Rng + ?Sized>(&mut self, cfg: &SimConfig, rng: &mut R) -> SimResult<()> {
        simulate_group_stage(&mut self.groups, &mut self.teams, cfg, rng)?;
        simulate_knockout_stage(&mut self.bracket, &mut self.teams, cfg, rng)?;
        Ok(())
    }

    pub fn finishes(&self) -> SimResult<Vec<(String, Finish)>> {
        self.teams
            .sorted_ids()
            .into_iter()
            .map(|id| {
                let finish = classify_finish(&self.bracket, &id)?;
                Ok((id, finish))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TeamOdds {
    pub team: String,
    // Keyed by `Finish::label`.
    pub finishes: BTreeMap<String, u64>,
    pub points_total: u64,
}

impl TeamOdds {
    pub fn probability(&self, finish: Finish, runs: u64) -> f64 {
        if runs == 0 {
            return 0.0;
        }
        self.finishes.get(&finish.label()).copied().unwrap_or(0) as f64 / runs as f64
    }

    pub fn mean_points(&self, runs: u64) -> f64 {
        if runs == 0 {
            return 0.0;
        }
        self.points_total as f64 / runs as f64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinishTable {
    pub runs: u64,
    pub seed: u64,
    pub teams: BTreeMap<String, TeamOdds>,
}

impl FinishTable {
    fn record(&mut self, t: &Tournament) -> SimResult<()> {
        self.runs += 1;
        for (id, finish) in t.finishes()? {
            let points = t.teams.get(&id)?.points;
            let entry = self.teams.entry(id.clone()).or_insert_with(|| TeamOdds {
                team: id,
                ..TeamOdds::default()
            });
            *entry.finishes.entry(finish.label()).or_insert(0) += 1;
            entry.points_total += u64::from(points);
        }
        Ok(())
    }

    fn merge(mut self, other: FinishTable) -> Self {
        self.runs += other.runs;
        for (id, odds) in other.teams {
            let entry = self.teams.entry(id).or_insert_with(|| TeamOdds {
                team: odds.team.clone(),
                ..TeamOdds::default()
            });
            for (label, n) in odds.finishes {
                *entry.finishes.entry(label).or_insert(0) += n;
            }
            entry.points_total += odds.points_total;
        }
        self
    }

    /// Teams by title probability, then by name.
    pub fn ranked(&self) -> Vec<&TeamOdds> {
        let mut rows = self.teams.values().collect::<Vec<_>>();
        rows.sort_by(|a, b| {
            let pa = a.probability(Finish::Champion, self.runs);
            let pb = b.probability(Finish::Champion, self.runs);
            pb.total_cmp(&pa).then(a.team.cmp(&b.team))
        });
        rows
    }
}

/// Runs `runs` independent copies of `base`. Run `i` uses its own generator seeded
/// with `seed + i`, so the table does not depend on how rayon splits the work.
pub fn simulate_many(
    base: &Tournament,
    cfg: &SimConfig,
    runs: u64,
    seed: u64,
) -> SimResult<FinishTable> {
    let mut table = (0..runs)
        .into_par_iter()
        .try_fold(FinishTable::default, |mut acc, run| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(run));
            let mut t = base.clone();
            t.simulate(cfg, &mut rng)?;
            acc.record(&t)?;
            Ok::<_, SimError>(acc)
        })
        .try_reduce(FinishTable::default, |a, b| Ok(a.merge(b)))?;
    table.seed = seed;
    info!("monte carlo: {} runs from seed {seed}", table.runs);
    Ok(table)
}
