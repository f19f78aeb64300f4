use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("probabilities must be floats between 0 and 1, inclusive (got {0})")]
    InvalidProbability(f64),
    #[error("unknown team `{0}`")]
    UnknownTeam(String),
    #[error("`{0}` cannot play itself")]
    SameTeam(String),
    #[error("knockout match {index} has an empty slot when it is played")]
    UnresolvedSlot { index: usize },
    #[error("invalid bracket: {0}")]
    InvalidBracket(String),
    #[error("knockout match {index} is already full, cannot place `{team}`")]
    SlotConflict { index: usize, team: String },
}

pub type SimResult<T> = std::result::Result<T, SimError>;
