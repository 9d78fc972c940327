//! Serializable snapshots for persisting games and matches.
//!
//! Snapshots hold only the authoritative state. Legal move sequences are
//! recomputed on restore, and restore rejects anything inconsistent.

use crate::board::Board;
use crate::config::MatchRules;
use crate::cube::Cube;
use crate::match_state::{MatchStanding, MatchState};
use crate::scoring::GameOutcome;
use crate::turn::TurnState;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Persistent form of a [`Game`](crate::Game).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GameSnapshot {
    /// Board position.
    pub board: Board,
    /// Turn in progress.
    pub turn: TurnState,
    /// Doubling cube.
    pub cube: Cube,
    /// Scoring rules.
    pub rules: MatchRules,
    /// Whether doubling is forbidden this game.
    pub crawford_game: bool,
    /// Match score when the game began.
    #[serde(default)]
    pub standing: MatchStanding,
    /// Rolls each player has made this game.
    #[serde(default)]
    pub rolls: [u32; 2],
    /// Result, if the game is over.
    pub outcome: Option<GameOutcome>,
}

/// Persistent form of a [`MatchSession`](crate::MatchSession).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SessionSnapshot {
    /// Scores and Crawford flags.
    pub state: MatchState,
    /// Current game.
    pub game: GameSnapshot,
    /// Whether the current game's result is already in the score.
    pub recorded: bool,
}

impl GameSnapshot {
    /// Serializes to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses from JSON. The result still has to go through `Game::restore`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// JSON schema of the snapshot format.
    pub fn schema() -> schemars::Schema {
        schemars::schema_for!(GameSnapshot)
    }
}

impl SessionSnapshot {
    /// Serializes to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses from JSON. The result still has to go through `MatchSession::restore`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// JSON schema of the snapshot format.
    pub fn schema() -> schemars::Schema {
        schemars::schema_for!(SessionSnapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Game;
    use crate::types::Player;

    #[test]
    fn test_schema_lists_top_level_fields() {
        let schema = serde_json::to_value(GameSnapshot::schema()).unwrap();
        let properties = schema["properties"].as_object().unwrap();
        for field in [
            "board",
            "turn",
            "cube",
            "rules",
            "crawford_game",
            "standing",
            "rolls",
            "outcome",
        ] {
            assert!(properties.contains_key(field), "missing {field}");
        }
        // Derived move sequences are never persisted.
        assert!(!schema["$defs"]["TurnState"]["properties"]
            .as_object()
            .unwrap()
            .contains_key("legal"));
    }

    #[test]
    fn test_json_round_trip() {
        let game = Game::new(MatchRules::match_to(3), false, Player::Black);
        let json = game.snapshot().to_json().unwrap();
        let parsed = GameSnapshot::from_json(&json).unwrap();
        assert_eq!(parsed, game.snapshot());
    }
}
