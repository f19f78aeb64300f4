use std::path::PathBuf;

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;

use wc26_simulator::config::{RunConfig, flag_value};
use wc26_simulator::group;
use wc26_simulator::loader;
use wc26_simulator::monte_carlo::Tournament;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let cfg = RunConfig::from_env().apply_args(&args);
    let path = |flag: &str, default: &str| {
        flag_value(&args, flag)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(default))
    };

    let teams = loader::load_teams(&path("--teams", "tests/fixtures/teams.csv"))?;
    let groups_path = path("--groups", "tests/fixtures/groups.csv");
    let groups = if groups_path.exists() {
        loader::load_group_fixtures(&groups_path)?
    } else {
        Vec::new()
    };
    let bracket =
        loader::load_knockout_fixtures(&path("--knockout", "tests/fixtures/knockout.csv"))?;

    let mut tournament = Tournament::new(teams, groups, bracket);
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    tournament
        .simulate(&cfg.sim, &mut rng)
        .context("simulation failed")?;

    println!("Seed: {}", cfg.seed);
    for (label, rows) in group::standings(&tournament.groups, &tournament.teams)? {
        if rows.is_empty() {
            continue;
        }
        println!();
        println!("Group {}", if label.is_empty() { "-" } else { label.as_str() });
        for row in rows {
            println!("  {:<16} {:>3} pts  elo {:.0}", row.team, row.points, row.rating);
        }
    }

    println!();
    println!("Knockout");
    for (idx, m) in tournament.bracket.matches().iter().enumerate() {
        println!(
            "  #{idx:<2} {:<14} v {:<14} p_home={:.3}  -> {}{}",
            m.home_team.as_deref().unwrap_or("?"),
            m.away_team.as_deref().unwrap_or("?"),
            m.elo_prob_home.unwrap_or(f64::NAN),
            m.advances.as_deref().unwrap_or("?"),
            if m.penalties { " (pens)" } else { "" }
        );
    }

    println!();
    println!("Finishes");
    for (team, finish) in tournament.finishes()? {
        println!("  {team:<16} {finish}");
    }
    Ok(())
}
