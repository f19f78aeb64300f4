use std::env;

use serde::{Deserialize, Serialize};

use crate::elo::{DEFAULT_K, EloConfig};

const DEFAULT_RUNS: usize = 10_000;
const DEFAULT_SEED: u64 = 2026;

/// Knobs every simulation entry point takes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    // false disables draws: every match is a binary home/away draw.
    pub ternary: bool,
    pub elo: EloConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ternary: true,
            elo: EloConfig::default(),
        }
    }
}

impl SimConfig {
    pub fn binary() -> Self {
        Self {
            ternary: false,
            ..Self::default()
        }
    }
}

/// Settings for the command-line runners, resolved from `.env`, the environment and flags.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub sim: SimConfig,
    pub runs: usize,
    pub seed: u64,
    // None lets rayon size the pool.
    pub threads: Option<usize>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            sim: SimConfig::default(),
            runs: DEFAULT_RUNS,
            seed: DEFAULT_SEED,
            threads: None,
        }
    }
}

impl RunConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let runs = env::var("SIM_RUNS")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(DEFAULT_RUNS)
            .clamp(1, 1_000_000);
        let seed = env::var("SIM_SEED")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(DEFAULT_SEED);
        let ternary = env::var("SIM_TERNARY")
            .ok()
            .and_then(|val| parse_bool(&val))
            .unwrap_or(true);
        let k = env::var("ELO_K")
            .ok()
            .and_then(|val| val.parse::<f64>().ok())
            .filter(|k| k.is_finite())
            .unwrap_or(DEFAULT_K)
            .clamp(1.0, 200.0);
        let threads = env::var("SIM_THREADS")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .map(|n| n.clamp(1, 256));

        Self {
            sim: SimConfig {
                ternary,
                elo: EloConfig { k },
            },
            runs,
            seed,
            threads,
        }
    }

    /// Applies `--runs`, `--seed`, `--threads` and `--binary` on top of the environment.
    pub fn apply_args(mut self, args: &[String]) -> Self {
        if let Some(runs) = flag_value(args, "--runs").and_then(|v| v.parse::<usize>().ok()) {
            self.runs = runs.clamp(1, 1_000_000);
        }
        if let Some(seed) = flag_value(args, "--seed").and_then(|v| v.parse::<u64>().ok()) {
            self.seed = seed;
        }
        if let Some(threads) = flag_value(args, "--threads").and_then(|v| v.parse::<usize>().ok())
        {
            self.threads = Some(threads.clamp(1, 256));
        }
        if args.iter().any(|a| a == "--binary") {
            self.sim.ternary = false;
        }
        self
    }
}

/// Reads `--name value` or `--name=value`.
pub fn flag_value(args: &[String], name: &str) -> Option<String> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(rest) = arg.strip_prefix(name) {
            if let Some(val) = rest.strip_prefix('=') {
                let trimmed = val.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            } else if rest.is_empty() {
                let Some(next) = args.get(idx + 1) else {
                    continue;
                };
                if !next.trim().is_empty() && !next.starts_with("--") {
                    return Some(next.trim().to_string());
                }
            }
        }
    }
    None
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
