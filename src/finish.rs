use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bracket::Bracket;
use crate::error::{SimError, SimResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Finish {
    Champion,
    RunnerUp,
    ThirdPlace,
    FourthPlace,
    // Teams left in the round, e.g. 8 for the quarterfinals.
    Eliminated { round_of: usize },
    GroupStage,
}

impl Finish {
    pub fn label(&self) -> String {
        match self {
            Finish::Champion => "Champion".to_string(),
            Finish::RunnerUp => "Second_place".to_string(),
            Finish::ThirdPlace => "Third_place".to_string(),
            Finish::FourthPlace => "Fourth_place".to_string(),
            Finish::Eliminated { round_of: 8 } => "Quarterfinals".to_string(),
            Finish::Eliminated { round_of: 4 } => "Semifinals".to_string(),
            Finish::Eliminated { round_of } => format!("Round_of_{round_of}"),
            Finish::GroupStage => "Group_stage".to_string(),
        }
    }
}

impl fmt::Display for Finish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Where `team` finished, judged by the last bracket match it appears in.
pub fn classify_finish(bracket: &Bracket, team: &str) -> SimResult<Finish> {
    let Some((idx, m)) = bracket
        .matches()
        .iter()
        .enumerate()
        .rev()
        .find(|(_, m)| m.involves(team))
    else {
        return Ok(Finish::GroupStage);
    };
    if !m.is_resolved() {
        return Err(SimError::UnresolvedSlot { index: idx });
    }
    let won = m.advances.as_deref() == Some(team);

    let finish = if idx == bracket.final_index() {
        if won { Finish::Champion } else { Finish::RunnerUp }
    } else if idx == bracket.third_place_index() {
        if won { Finish::ThirdPlace } else { Finish::FourthPlace }
    } else {
        let depth = bracket.round_depth(idx).unwrap_or(0);
        Finish::Eliminated {
            round_of: 2usize << depth,
        }
    };
    Ok(finish)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::standard_wiring;
    use crate::prob::Outcome;
    use crate::state::KnockoutMatch;

    fn decided(home: &str, away: &str, to: Option<usize>) -> KnockoutMatch {
        KnockoutMatch::between(home, away, to).with_result(home, away, Outcome::Home, false)
    }

    fn played_out() -> Bracket {
        let w = standard_wiring(4);
        let matches = vec![
            decided("A", "B", w[0]),
            decided("C", "D", w[1]),
            decided("E", "F", w[2]),
            decided("G", "H", w[3]),
            decided("A", "C", w[4]),
            decided("E", "G", w[5]),
            decided("A", "E", w[6]),
            decided("C", "G", w[7]),
        ];
        Bracket::new(matches).unwrap()
    }

    #[test]
    fn podium_comes_from_the_last_two_matches() {
        let b = played_out();
        assert_eq!(classify_finish(&b, "A").unwrap(), Finish::Champion);
        assert_eq!(classify_finish(&b, "E").unwrap(), Finish::RunnerUp);
        assert_eq!(classify_finish(&b, "C").unwrap(), Finish::ThirdPlace);
        assert_eq!(classify_finish(&b, "G").unwrap(), Finish::FourthPlace);
    }

    #[test]
    fn early_exits_are_named_by_round() {
        let b = played_out();
        let finish = classify_finish(&b, "B").unwrap();
        assert_eq!(finish, Finish::Eliminated { round_of: 8 });
        assert_eq!(finish.label(), "Quarterfinals");
        assert_eq!(Finish::Eliminated { round_of: 16 }.label(), "Round_of_16");
        assert_eq!(classify_finish(&b, "Z").unwrap(), Finish::GroupStage);
    }

    #[test]
    fn undecided_match_cannot_be_classified() {
        let w = standard_wiring(2);
        let matches = vec![
            KnockoutMatch::between("A", "B", w[0]),
            KnockoutMatch::between("C", "D", w[1]),
            KnockoutMatch::pending(w[2]),
            KnockoutMatch::pending(w[3]),
        ];
        let b = Bracket::new(matches).unwrap();
        assert_eq!(
            classify_finish(&b, "A").unwrap_err(),
            SimError::UnresolvedSlot { index: 0 }
        );
    }
}
