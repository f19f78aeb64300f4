use log::{debug, info};
use rand::Rng;

use crate::bracket::Bracket;
use crate::config::SimConfig;
use crate::elo;
use crate::error::{SimError, SimResult};
use crate::group::StageSummary;
use crate::sampler;
use crate::state::Teams;

/// Resolves the bracket in index order.
///
/// Each match is played once its slots are filled, then its teams are moved into
/// the successor slots before the next index is visited. Matches that already have
/// `advances` and `loses` only get their probability refreshed.
pub fn simulate_knockout_stage<R: Rng + ?Sized>(
    bracket: &mut Bracket,
    teams: &mut Teams,
    cfg: &SimConfig,
    rng: &mut R,
) -> SimResult<StageSummary> {
    let mut summary = StageSummary::default();
    for idx in 0..bracket.len() {
        resolve_match(bracket, idx, teams, cfg, rng, &mut summary)?;
        bracket.propagate(idx)?;
    }
    info!(
        "knockout stage: {} recorded, {} simulated, {} shootouts",
        summary.recorded, summary.simulated, summary.penalties
    );
    Ok(summary)
}

fn resolve_match<R: Rng + ?Sized>(
    bracket: &mut Bracket,
    idx: usize,
    teams: &mut Teams,
    cfg: &SimConfig,
    rng: &mut R,
    summary: &mut StageSummary,
) -> SimResult<()> {
    let m = bracket
        .match_mut(idx)
        .ok_or(SimError::UnresolvedSlot { index: idx })?;
    let (Some(home_id), Some(away_id)) = (m.home_team.clone(), m.away_team.clone()) else {
        return Err(SimError::UnresolvedSlot { index: idx });
    };

    let (home, away) = teams.pair_mut(&home_id, &away_id)?;
    let p_home = elo::win_probability(home.rating, away.rating);
    m.elo_prob_home = Some(p_home);

    if m.is_resolved() {
        summary.recorded += 1;
        return Ok(());
    }

    let result = sampler::sample_knockout_result(&home_id, &away_id, p_home, cfg.ternary, rng)?;
    // A shootout still counts as a draw for the ratings.
    let shift = elo::apply_rating_shift(
        home,
        away,
        result.result_home.home_score(),
        p_home,
        cfg.elo,
    );

    debug!(
        "knockout #{idx} {home_id} v {away_id}: p_home={p_home:.3} advances={}{} shift={shift:+.2}",
        result.advances,
        if result.penalties { " (pens)" } else { "" },
    );

    summary.simulated += 1;
    if result.penalties {
        summary.penalties += 1;
    }
    m.result_home = Some(result.result_home);
    m.penalties = result.penalties;
    m.advances = Some(result.advances);
    m.loses = Some(result.loses);
    Ok(())
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand::rngs::mock::StepRng;

    use super::*;
    use crate::bracket::standard_wiring;
    use crate::prob::Outcome;
    use crate::state::{KnockoutMatch, Team};

    fn four_team_bracket() -> (Bracket, Teams) {
        let wiring = standard_wiring(2);
        let matches = vec![
            KnockoutMatch::between("ARG", "CRO", wiring[0]),
            KnockoutMatch::between("FRA", "MAR", wiring[1]),
            KnockoutMatch::pending(wiring[2]),
            KnockoutMatch::pending(wiring[3]),
        ];
        let teams = [
            ("ARG", 1500.0),
            ("CRO", 1500.0),
            ("FRA", 1500.0),
            ("MAR", 1500.0),
        ]
        .into_iter()
        .map(|(id, r)| (id.to_string(), Team::new(r)))
        .collect();
        (Bracket::new(matches).unwrap(), teams)
    }

    #[test]
    fn every_match_is_decided_and_wired() {
        let (mut bracket, mut teams) = four_team_bracket();
        let mut rng = StdRng::seed_from_u64(2022);
        let summary =
            simulate_knockout_stage(&mut bracket, &mut teams, &SimConfig::default(), &mut rng)
                .unwrap();
        assert_eq!(summary.simulated, 4);

        let semis = &bracket.matches()[..2];
        let final_match = &bracket.matches()[2];
        let third = &bracket.matches()[3];
        for semi in semis {
            let winner = semi.advances.as_deref().unwrap();
            let loser = semi.loses.as_deref().unwrap();
            assert!(final_match.involves(winner));
            assert!(third.involves(loser));
        }
        assert!(final_match.is_resolved() && third.is_resolved());
    }

    #[test]
    fn all_shootouts_when_every_draw_is_a_tie() {
        let (mut bracket, mut teams) = four_team_bracket();
        let mut rng = StepRng::new(1 << 63, 0);
        let summary =
            simulate_knockout_stage(&mut bracket, &mut teams, &SimConfig::default(), &mut rng)
                .unwrap();
        assert_eq!(summary.penalties, 4);
        for m in bracket.matches() {
            assert!(m.penalties);
            assert_eq!(m.result_home, Some(Outcome::Draw));
        }
        // Drawn matches between equals leave ratings untouched.
        assert_eq!(teams.rating("ARG").unwrap(), 1500.0);
    }

    #[test]
    fn recorded_matches_are_not_replayed() {
        let (bracket, mut teams) = four_team_bracket();
        let mut matches = bracket.into_matches();
        matches[0] = matches[0]
            .clone()
            .with_result("CRO", "ARG", Outcome::Draw, true);
        let mut bracket = Bracket::new(matches).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        let summary =
            simulate_knockout_stage(&mut bracket, &mut teams, &SimConfig::default(), &mut rng)
                .unwrap();

        assert_eq!(summary.recorded, 1);
        assert_eq!(summary.simulated, 3);
        assert_eq!(bracket.matches()[0].advances.as_deref(), Some("CRO"));
        assert_eq!(bracket.matches()[2].home_team.as_deref(), Some("CRO"));
        assert_eq!(bracket.matches()[3].home_team.as_deref(), Some("ARG"));
    }

    #[test]
    fn second_pass_changes_nothing() {
        let (mut bracket, mut teams) = four_team_bracket();
        let cfg = SimConfig::default();
        let mut rng = StdRng::seed_from_u64(8);
        simulate_knockout_stage(&mut bracket, &mut teams, &cfg, &mut rng).unwrap();
        let before = (bracket.clone(), teams.clone());

        let summary = simulate_knockout_stage(&mut bracket, &mut teams, &cfg, &mut rng).unwrap();
        assert_eq!(summary.simulated, 0);
        assert_eq!(summary.recorded, 4);
        assert_eq!(before.1, teams);
        for (a, b) in before.0.matches().iter().zip(bracket.matches()) {
            assert_eq!(a.advances, b.advances);
            assert_eq!(a.home_team, b.home_team);
            assert_eq!(a.away_team, b.away_team);
        }
    }

    #[test]
    fn empty_slot_is_reported() {
        let matches = vec![
            KnockoutMatch::between("ARG", "CRO", Some(2)),
            KnockoutMatch::pending(Some(2)),
            KnockoutMatch::pending(None),
            KnockoutMatch::pending(None),
        ];
        let mut bracket = Bracket::new(matches).unwrap();
        let (_, mut teams) = four_team_bracket();
        let mut rng = StdRng::seed_from_u64(1);
        let err = simulate_knockout_stage(&mut bracket, &mut teams, &SimConfig::default(), &mut rng)
            .unwrap_err();
        assert_eq!(err, SimError::UnresolvedSlot { index: 1 });
    }
}
