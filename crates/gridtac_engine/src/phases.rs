//! Game phases and outcomes.

use super::Mark;
use serde::{Deserialize, Serialize};

/// Where a game is in its lifecycle.
///
/// `MoveApplied` is transient: it is observed only between a move landing on
/// the board and the terminal check that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for the player to move.
    AwaitingMove,
    /// A move was placed, terminal check pending.
    MoveApplied,
    /// A winner or draw has been recorded. Absorbing.
    Finished,
}

/// Outcome of a finished game.
///
/// Serialized as `"X"`, `"O"` or `"Draw"`, the same tokens stored by the
/// persistence layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Outcome {
    /// Player completed a line.
    Winner(Mark),
    /// Board filled with no line.
    Draw,
}

impl Outcome {
    /// Returns the winner if there is one.
    pub fn winner(&self) -> Option<Mark> {
        match self {
            Outcome::Winner(mark) => Some(*mark),
            Outcome::Draw => None,
        }
    }

    /// Token used on the wire and in storage.
    pub fn as_token(&self) -> &'static str {
        match self {
            Outcome::Winner(Mark::X) => "X",
            Outcome::Winner(Mark::O) => "O",
            Outcome::Draw => "Draw",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_token())
    }
}

impl std::str::FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "X" => Ok(Outcome::Winner(Mark::X)),
            "O" => Ok(Outcome::Winner(Mark::O)),
            "Draw" => Ok(Outcome::Draw),
            other => Err(format!("Invalid outcome: '{}'", other)),
        }
    }
}

impl From<Outcome> for String {
    fn from(outcome: Outcome) -> Self {
        outcome.as_token().to_string()
    }
}

impl TryFrom<String> for Outcome {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_tokens() {
        assert_eq!(Outcome::Winner(Mark::X).to_string(), "X");
        assert_eq!(Outcome::Draw.to_string(), "Draw");
        assert_eq!("O".parse::<Outcome>(), Ok(Outcome::Winner(Mark::O)));
        assert!("draw".parse::<Outcome>().is_err());
    }

    #[test]
    fn test_outcome_serde() {
        let json = serde_json::to_string(&Some(Outcome::Draw)).unwrap();
        assert_eq!(json, r#""Draw""#);
        let parsed: Option<Outcome> = serde_json::from_str(r#""X""#).unwrap();
        assert_eq!(parsed, Some(Outcome::Winner(Mark::X)));
        let none: Option<Outcome> = serde_json::from_str("null").unwrap();
        assert_eq!(none, None);
    }
}
