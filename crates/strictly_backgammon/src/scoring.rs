//! Converting a finished game into match points.

use crate::board::Board;
use crate::config::MatchRules;
use crate::cube::Cube;
use crate::types::Player;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How thoroughly a game was won.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
    strum::Display,
)]
pub enum GammonLevel {
    /// The loser bore off at least one checker.
    Single,
    /// The loser bore off nothing.
    Gammon,
    /// Gammon with a losing checker on the bar or in the winner's home board.
    Backgammon,
}

impl GammonLevel {
    /// Point multiplier (1, 2 or 3).
    pub fn multiplier(self) -> u32 {
        match self {
            GammonLevel::Single => 1,
            GammonLevel::Gammon => 2,
            GammonLevel::Backgammon => 3,
        }
    }

    /// Level of a game `winner` has just won by bearing off.
    pub fn assess(board: &Board, winner: Player) -> Self {
        let loser = winner.opponent();
        if board.off(loser) > 0 {
            return GammonLevel::Single;
        }
        let in_winner_home = board
            .occupied_by(loser)
            .any(|index| winner.home().contains(&index));
        if board.bar(loser) > 0 || in_winner_home {
            GammonLevel::Backgammon
        } else {
            GammonLevel::Gammon
        }
    }
}

/// What a resigning player concedes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ResignationKind {
    /// One cube value.
    Single,
    /// Two cube values.
    Gammon,
    /// Three cube values.
    Backgammon,
}

impl ResignationKind {
    /// Gammon level the resignation concedes.
    pub fn level(self) -> GammonLevel {
        match self {
            ResignationKind::Single => GammonLevel::Single,
            ResignationKind::Gammon => GammonLevel::Gammon,
            ResignationKind::Backgammon => GammonLevel::Backgammon,
        }
    }
}

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum EndReason {
    /// The winner bore off all checkers.
    BearOff,
    /// The loser passed a double.
    DoubleDeclined,
    /// The loser resigned.
    Resignation(ResignationKind),
}

/// Final result of one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GameOutcome {
    /// Player who won the game.
    pub winner: Player,
    /// Level the points were computed with.
    pub gammon_level: GammonLevel,
    /// Match points the winner receives.
    pub points_awarded: u32,
    /// Cube value at the end of the game.
    pub cube_value: u32,
    /// How the game ended.
    pub reason: EndReason,
}

/// Gammon level after the Jacoby rule: with the rule on and the cube never
/// turned, every win counts single.
pub fn effective_level(level: GammonLevel, cube: &Cube, rules: &MatchRules) -> GammonLevel {
    if *rules.jacoby() && cube.is_unturned() {
        GammonLevel::Single
    } else {
        level
    }
}

/// Points for a game won at `level` with the given cube.
pub fn points_awarded(level: GammonLevel, cube: &Cube, rules: &MatchRules) -> u32 {
    cube.value()
        .saturating_mul(effective_level(level, cube, rules).multiplier())
}
