use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use log::{info, warn};
use serde::Serialize;

use wc26_simulator::SimConfig;
use wc26_simulator::config::{RunConfig, flag_value};
use wc26_simulator::finish::Finish;
use wc26_simulator::loader;
use wc26_simulator::monte_carlo::{self, FinishTable, Tournament};

const DEFAULT_TEAMS: &str = "tests/fixtures/teams.csv";
const DEFAULT_GROUPS: &str = "tests/fixtures/groups.csv";
const DEFAULT_KNOCKOUT: &str = "tests/fixtures/knockout.csv";

#[derive(Debug, Serialize)]
struct Report<'a> {
    generated_at: String,
    config: SimConfig,
    table: &'a FinishTable,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let cfg = RunConfig::from_env().apply_args(&args);

    let teams_path = path_arg(&args, "--teams", DEFAULT_TEAMS);
    let groups_path = path_arg(&args, "--groups", DEFAULT_GROUPS);
    let knockout_path = path_arg(&args, "--knockout", DEFAULT_KNOCKOUT);

    let teams = loader::load_teams(&teams_path)?;
    let groups = if groups_path.exists() {
        loader::load_group_fixtures(&groups_path)?
    } else {
        warn!("no group fixtures at {}, skipping group stage", groups_path.display());
        Vec::new()
    };
    let bracket = loader::load_knockout_fixtures(&knockout_path)?;
    info!(
        "loaded {} teams, {} group fixtures, {} knockout fixtures",
        teams.len(),
        groups.len(),
        bracket.len()
    );

    let base = Tournament::new(teams, groups, bracket);
    let started = Utc::now();
    let table = run_on_threads(cfg.threads, || {
        monte_carlo::simulate_many(&base, &cfg.sim, cfg.runs as u64, cfg.seed)
    })?
    .context("simulation failed")?;
    let elapsed = Utc::now() - started;
    info!(
        "{} runs in {} ms (ternary={}, k={})",
        table.runs,
        elapsed.num_milliseconds(),
        cfg.sim.ternary,
        cfg.sim.elo.k
    );

    if args.iter().any(|a| a == "--json") {
        let report = Report {
            generated_at: started.to_rfc3339(),
            config: cfg.sim,
            table: &table,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("serialize report")?
        );
    } else {
        print_table(&table);
    }
    Ok(())
}

fn print_table(table: &FinishTable) {
    let runs = table.runs;
    println!(
        "{:<16} {:>8} {:>8} {:>8} {:>8}",
        "Team", "Champ%", "Final%", "Semis%", "Pts"
    );
    for odds in table.ranked() {
        let champ = odds.probability(Finish::Champion, runs);
        let final_ = champ + odds.probability(Finish::RunnerUp, runs);
        let semis = final_
            + odds.probability(Finish::ThirdPlace, runs)
            + odds.probability(Finish::FourthPlace, runs);
        println!(
            "{:<16} {:>8.1} {:>8.1} {:>8.1} {:>8.2}",
            odds.team,
            champ * 100.0,
            final_ * 100.0,
            semis * 100.0,
            odds.mean_points(runs)
        );
    }
}

fn path_arg(args: &[String], flag: &str, default: &str) -> PathBuf {
    flag_value(args, flag)
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(default).to_path_buf())
}

/// Runs `action` on a dedicated pool when a thread count is set, else on rayon's global pool.
fn run_on_threads<T: Send>(threads: Option<usize>, action: impl FnOnce() -> T + Send) -> Result<T> {
    let Some(threads) = threads else {
        return Ok(action());
    };
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .with_context(|| format!("building a {threads}-thread pool"))?;
    Ok(pool.install(action))
}
