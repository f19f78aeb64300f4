//! Single-elimination bracket with a third-place match.
//!
//! Matches live in a flat arena addressed by index. Every match before the final
//! names the later match its winner moves into. Matches that feed the final are the
//! semifinals: their losers move into the third-place match. The final is the
//! second-to-last entry and the third-place match is the last one.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::state::KnockoutMatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Feed {
    Winner,
    Loser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Successor {
    pub index: usize,
    pub feed: Feed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bracket {
    matches: Vec<KnockoutMatch>,
    // Hops from each match to the final; 0 for the final and third-place match.
    depth: Vec<usize>,
}

impl Bracket {
    /// Checks the wiring: every successor sits strictly later and no later than the
    /// final, the final and third-place match have none, and no match is fed by more
    /// than two earlier ones.
    pub fn new(matches: Vec<KnockoutMatch>) -> SimResult<Self> {
        let len = matches.len();
        if len < 2 {
            return Err(SimError::InvalidBracket(format!(
                "need at least a final and a third-place match, got {len} matches"
            )));
        }
        let final_idx = len - 2;

        let mut feeders = vec![0usize; len];
        for (idx, m) in matches.iter().enumerate() {
            match (idx >= final_idx, m.to_match) {
                (true, None) => {}
                (true, Some(to)) => {
                    return Err(SimError::InvalidBracket(format!(
                        "match {idx} is terminal but points to match {to}"
                    )));
                }
                (false, None) => {
                    return Err(SimError::InvalidBracket(format!(
                        "match {idx} has no successor"
                    )));
                }
                (false, Some(to)) if to <= idx || to > final_idx => {
                    return Err(SimError::InvalidBracket(format!(
                        "match {idx} feeds match {to}, expected {} to {final_idx}",
                        idx + 1
                    )));
                }
                (false, Some(to)) => {
                    feeders[to] += 1;
                    if to == final_idx {
                        feeders[final_idx + 1] += 1;
                    }
                }
            }
        }
        if let Some((idx, count)) = feeders.iter().enumerate().find(|(_, c)| **c > 2) {
            return Err(SimError::InvalidBracket(format!(
                "match {idx} is fed by {count} matches"
            )));
        }

        for (idx, m) in matches.iter().enumerate() {
            check_recorded(idx, m)?;
        }

        let mut depth = vec![0usize; len];
        for idx in (0..final_idx).rev() {
            if let Some(to) = matches[idx].to_match {
                depth[idx] = depth[to] + 1;
            }
        }

        Ok(Self { matches, depth })
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn final_index(&self) -> usize {
        self.matches.len() - 2
    }

    pub fn third_place_index(&self) -> usize {
        self.matches.len() - 1
    }

    pub fn matches(&self) -> &[KnockoutMatch] {
        &self.matches
    }

    pub fn get(&self, idx: usize) -> Option<&KnockoutMatch> {
        self.matches.get(idx)
    }

    pub(crate) fn match_mut(&mut self, idx: usize) -> Option<&mut KnockoutMatch> {
        self.matches.get_mut(idx)
    }

    pub fn into_matches(self) -> Vec<KnockoutMatch> {
        self.matches
    }

    /// Rounds between this match and the final: 1 for semifinals, 2 for quarterfinals.
    pub fn round_depth(&self, idx: usize) -> Option<usize> {
        self.depth.get(idx).copied()
    }

    /// Where the winner (and for semifinals, the loser) of `idx` goes next.
    pub fn successors(&self, idx: usize) -> Vec<Successor> {
        let Some(to) = self.matches.get(idx).and_then(|m| m.to_match) else {
            return Vec::new();
        };
        let mut out = vec![Successor {
            index: to,
            feed: Feed::Winner,
        }];
        if to == self.final_index() {
            out.push(Successor {
                index: self.third_place_index(),
                feed: Feed::Loser,
            });
        }
        out
    }

    /// Moves the decided teams of `idx` into their successor slots.
    pub fn propagate(&mut self, idx: usize) -> SimResult<()> {
        let successors = self.successors(idx);
        if successors.is_empty() {
            return Ok(());
        }
        let m = &self.matches[idx];
        let (Some(winner), Some(loser)) = (m.advances.clone(), m.loses.clone()) else {
            return Err(SimError::UnresolvedSlot { index: idx });
        };
        for s in successors {
            let team = match s.feed {
                Feed::Winner => winner.clone(),
                Feed::Loser => loser.clone(),
            };
            self.place(s.index, team)?;
        }
        Ok(())
    }

    // Home slot first, then away. A team already in the match stays where it is.
    fn place(&mut self, idx: usize, team: String) -> SimResult<()> {
        let m = &mut self.matches[idx];
        if m.involves(&team) {
            return Ok(());
        }
        if m.home_team.is_none() {
            m.home_team = Some(team);
        } else if m.away_team.is_none() {
            m.away_team = Some(team);
        } else {
            return Err(SimError::SlotConflict { index: idx, team });
        }
        Ok(())
    }
}

/// Wiring of a standard bracket for `first_round` opening matches (a power of two):
/// winners of matches `2i` and `2i + 1` meet in the next round, finishing with the
/// final and the third-place match.
pub fn standard_wiring(first_round: usize) -> Vec<Option<usize>> {
    let mut out = Vec::new();
    let mut round_start = 0;
    let mut round_len = first_round;
    while round_len > 1 {
        let next_start = round_start + round_len;
        for i in 0..round_len {
            out.push(Some(next_start + i / 2));
        }
        round_start = next_start;
        round_len /= 2;
    }
    // final, third place
    out.push(None);
    out.push(None);
    out
}

/// A recorded result must name both sides of the match, one advancing and one out.
fn check_recorded(idx: usize, m: &KnockoutMatch) -> SimResult<()> {
    let (advances, loses) = match (&m.advances, &m.loses) {
        (None, None) => return Ok(()),
        (Some(a), Some(l)) => (a, l),
        _ => {
            return Err(SimError::InvalidBracket(format!(
                "match {idx} records only one of advances/loses"
            )));
        }
    };
    let (Some(home), Some(away)) = (&m.home_team, &m.away_team) else {
        return Err(SimError::InvalidBracket(format!(
            "match {idx} has a result but an empty slot"
        )));
    };
    let sides_match = (advances == home && loses == away) || (advances == away && loses == home);
    if advances == loses || !sides_match {
        return Err(SimError::InvalidBracket(format!(
            "match {idx} between {home} and {away} records {advances} advancing and {loses} out"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prob::Outcome;

    fn sixteen_team_bracket() -> Vec<KnockoutMatch> {
        standard_wiring(8)
            .into_iter()
            .map(KnockoutMatch::pending)
            .collect()
    }

    #[test]
    fn standard_wiring_matches_world_cup_layout() {
        let wiring = standard_wiring(8);
        assert_eq!(wiring.len(), 16);
        assert_eq!(wiring[0], Some(8));
        assert_eq!(wiring[7], Some(11));
        assert_eq!(wiring[8], Some(12));
        assert_eq!(wiring[11], Some(13));
        assert_eq!(wiring[12], Some(14));
        assert_eq!(wiring[13], Some(14));
        assert_eq!(wiring[14], None);
        assert_eq!(wiring[15], None);
    }

    #[test]
    fn depth_counts_rounds_to_the_final() {
        let b = Bracket::new(sixteen_team_bracket()).unwrap();
        assert_eq!(b.final_index(), 14);
        assert_eq!(b.third_place_index(), 15);
        assert_eq!(b.round_depth(0), Some(3));
        assert_eq!(b.round_depth(9), Some(2));
        assert_eq!(b.round_depth(13), Some(1));
        assert_eq!(b.round_depth(14), Some(0));
        assert_eq!(b.round_depth(15), Some(0));
    }

    #[test]
    fn semifinal_feeds_final_and_third_place() {
        let b = Bracket::new(sixteen_team_bracket()).unwrap();
        assert_eq!(
            b.successors(12),
            vec![
                Successor {
                    index: 14,
                    feed: Feed::Winner
                },
                Successor {
                    index: 15,
                    feed: Feed::Loser
                },
            ]
        );
        assert_eq!(b.successors(3).len(), 1);
        assert!(b.successors(14).is_empty());
        assert!(b.successors(15).is_empty());
    }

    #[test]
    fn backwards_wiring_is_rejected() {
        let mut matches = sixteen_team_bracket();
        matches[9].to_match = Some(3);
        assert!(matches!(
            Bracket::new(matches),
            Err(SimError::InvalidBracket(_))
        ));
    }

    #[test]
    fn overfed_match_is_rejected() {
        let mut matches = sixteen_team_bracket();
        matches[2].to_match = Some(8);
        assert!(matches!(
            Bracket::new(matches),
            Err(SimError::InvalidBracket(_))
        ));
    }

    #[test]
    fn recorded_result_must_name_the_two_sides() {
        let wiring = standard_wiring(8);
        let recorded = |advances: &str, loses: &str| {
            let mut matches = sixteen_team_bracket();
            matches[0] = KnockoutMatch::between("NED", "USA", wiring[0]).with_result(
                advances,
                loses,
                Outcome::Home,
                false,
            );
            Bracket::new(matches)
        };

        assert!(recorded("NED", "USA").is_ok());
        assert!(recorded("USA", "NED").is_ok());
        for (advances, loses) in [("NED", "NED"), ("NED", "ARG"), ("ARG", "USA")] {
            assert!(
                matches!(recorded(advances, loses), Err(SimError::InvalidBracket(_))),
                "{advances} over {loses}"
            );
        }

        let mut half = sixteen_team_bracket();
        half[0] = KnockoutMatch::between("NED", "USA", wiring[0]);
        half[0].advances = Some("NED".to_string());
        assert!(matches!(Bracket::new(half), Err(SimError::InvalidBracket(_))));

        let mut empty_slot = sixteen_team_bracket();
        empty_slot[8].advances = Some("NED".to_string());
        empty_slot[8].loses = Some("ARG".to_string());
        assert!(matches!(
            Bracket::new(empty_slot),
            Err(SimError::InvalidBracket(_))
        ));
    }

    #[test]
    fn terminal_matches_must_not_point_anywhere() {
        let mut matches = sixteen_team_bracket();
        matches[14].to_match = Some(15);
        assert!(Bracket::new(matches).is_err());
        assert!(Bracket::new(vec![KnockoutMatch::pending(None)]).is_err());
    }

    #[test]
    fn propagation_fills_home_then_away() {
        let mut matches = sixteen_team_bracket();
        matches[0] = KnockoutMatch::between("URU", "POR", Some(8)).with_result(
            "POR",
            "URU",
            Outcome::Away,
            false,
        );
        matches[1] = KnockoutMatch::between("FRA", "ARG", Some(8)).with_result(
            "FRA",
            "ARG",
            Outcome::Home,
            false,
        );
        let mut b = Bracket::new(matches).unwrap();
        b.propagate(0).unwrap();
        b.propagate(1).unwrap();
        let qf = b.get(8).unwrap();
        assert_eq!(qf.home_team.as_deref(), Some("POR"));
        assert_eq!(qf.away_team.as_deref(), Some("FRA"));

        // Re-propagating is a no-op.
        b.propagate(0).unwrap();
        assert_eq!(b.get(8).unwrap().away_team.as_deref(), Some("FRA"));
    }

    #[test]
    fn propagation_refuses_to_overwrite() {
        let mut matches = sixteen_team_bracket();
        matches[0] = KnockoutMatch::between("URU", "POR", Some(8)).with_result(
            "POR",
            "URU",
            Outcome::Away,
            false,
        );
        matches[8] = KnockoutMatch::between("BRA", "MEX", Some(12));
        let mut b = Bracket::new(matches).unwrap();
        let err = b.propagate(0).unwrap_err();
        assert_eq!(
            err,
            SimError::SlotConflict {
                index: 8,
                team: "POR".to_string()
            }
        );
    }

    #[test]
    fn unresolved_match_cannot_propagate() {
        let mut b = Bracket::new(sixteen_team_bracket()).unwrap();
        assert_eq!(
            b.propagate(4).unwrap_err(),
            SimError::UnresolvedSlot { index: 4 }
        );
        // Terminal matches have nothing to move.
        b.propagate(14).unwrap();
    }
}
