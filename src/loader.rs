//! Tournament input from CSV.
//!
//! Teams: `team,rating[,points]`. Group fixtures: `[group,]home_team,away_team[,result_home]`.
//! Knockout fixtures: `match,home_team,away_team[,result_home,advances,loses,penalties],to_match`.
//! Empty cells are unset. Files may be UTF-8 or Latin-1.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;

use crate::bracket::Bracket;
use crate::config::parse_bool;
use crate::prob::Outcome;
use crate::state::{GroupMatch, KnockoutMatch, Team, Teams};

#[derive(Debug, Deserialize)]
struct TeamRow {
    team: String,
    rating: f64,
    #[serde(default)]
    points: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GroupRow {
    #[serde(default)]
    group: Option<String>,
    home_team: String,
    away_team: String,
    #[serde(default)]
    result_home: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct KnockoutRow {
    #[serde(rename = "match")]
    number: usize,
    #[serde(default)]
    home_team: Option<String>,
    #[serde(default)]
    away_team: Option<String>,
    #[serde(default)]
    result_home: Option<f64>,
    #[serde(default)]
    advances: Option<String>,
    #[serde(default)]
    loses: Option<String>,
    #[serde(default)]
    penalties: Option<String>,
    #[serde(default)]
    to_match: Option<f64>,
}

pub fn load_teams(path: &Path) -> Result<Teams> {
    let raw = read_text(path)?;
    parse_teams(&raw).with_context(|| format!("parse teams from {}", path.display()))
}

pub fn load_group_fixtures(path: &Path) -> Result<Vec<GroupMatch>> {
    let raw = read_text(path)?;
    parse_group_fixtures(&raw)
        .with_context(|| format!("parse group fixtures from {}", path.display()))
}

pub fn load_knockout_fixtures(path: &Path) -> Result<Bracket> {
    let raw = read_text(path)?;
    parse_knockout_fixtures(&raw)
        .with_context(|| format!("parse knockout fixtures from {}", path.display()))
}

pub fn parse_teams(raw: &str) -> Result<Teams> {
    let mut teams = Teams::new();
    for (line, row) in reader(raw).deserialize::<TeamRow>().enumerate() {
        let row = row.with_context(|| format!("team row {}", line + 1))?;
        let id = row.team.trim().to_string();
        if id.is_empty() {
            bail!("team row {} has no name", line + 1);
        }
        if !row.rating.is_finite() {
            bail!("team {id} has a non-finite rating");
        }
        let team = Team {
            rating: row.rating,
            points: row.points.unwrap_or(0),
        };
        if teams.insert(id.clone(), team).is_some() {
            bail!("team {id} is listed twice");
        }
    }
    Ok(teams)
}

pub fn parse_group_fixtures(raw: &str) -> Result<Vec<GroupMatch>> {
    let mut out = Vec::new();
    for (line, row) in reader(raw).deserialize::<GroupRow>().enumerate() {
        let row = row.with_context(|| format!("group fixture row {}", line + 1))?;
        let result_home = row
            .result_home
            .map(parse_outcome)
            .transpose()
            .with_context(|| format!("group fixture row {}", line + 1))?;
        out.push(GroupMatch {
            group: non_empty(row.group),
            home_team: row.home_team.trim().to_string(),
            away_team: row.away_team.trim().to_string(),
            result_home,
            elo_prob_home: None,
        });
    }
    Ok(out)
}

/// Rows are ordered by `match`, which must run 0..n without gaps. The last two rows are
/// the final and the third-place match; their `to_match` is ignored.
pub fn parse_knockout_fixtures(raw: &str) -> Result<Bracket> {
    let mut rows = Vec::new();
    for (line, row) in reader(raw).deserialize::<KnockoutRow>().enumerate() {
        rows.push(row.with_context(|| format!("knockout row {}", line + 1))?);
    }
    rows.sort_by_key(|r| r.number);
    let len = rows.len();

    let mut matches = Vec::with_capacity(len);
    for (idx, row) in rows.into_iter().enumerate() {
        if row.number != idx {
            bail!(
                "knockout matches must be numbered 0..{len}, found {} at {idx}",
                row.number
            );
        }
        let terminal = idx + 2 >= len;
        let to_match = if terminal {
            None
        } else {
            let raw_to = row
                .to_match
                .ok_or_else(|| anyhow!("knockout match {idx} has no to_match"))?;
            if raw_to < 0.0 || raw_to.fract() != 0.0 {
                bail!("knockout match {idx} has a bad to_match {raw_to}");
            }
            Some(raw_to as usize)
        };
        let result_home = row
            .result_home
            .map(parse_outcome)
            .transpose()
            .with_context(|| format!("knockout match {idx}"))?;
        let penalties = match non_empty(row.penalties) {
            Some(flag) => parse_bool(&flag)
                .ok_or_else(|| anyhow!("knockout match {idx} has a bad penalties flag {flag:?}"))?,
            None => false,
        };
        matches.push(KnockoutMatch {
            home_team: non_empty(row.home_team),
            away_team: non_empty(row.away_team),
            result_home,
            elo_prob_home: None,
            advances: non_empty(row.advances),
            loses: non_empty(row.loses),
            penalties,
            to_match,
        });
    }
    Ok(Bracket::new(matches)?)
}

fn reader(raw: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(raw.as_bytes())
}

fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    Ok(decode_text(bytes))
}

// Exports from spreadsheet tools are often Latin-1.
fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => err.into_bytes().iter().map(|&b| b as char).collect(),
    }
}

fn parse_outcome(score: f64) -> Result<Outcome> {
    Outcome::from_home_score(score)
        .ok_or_else(|| anyhow!("result_home must be 0, 0.5 or 1, got {score}"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
