//! Domain events emitted by games and sessions.

use crate::cube::CubeResolution;
use crate::dice::Roll;
use crate::scoring::{EndReason, GammonLevel};
use crate::types::{Move, Player};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Something observable that happened in a game or match.
///
/// Events are queued in order and handed out by `drain_events`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameEvent {
    /// A player's turn began.
    TurnStarted {
        /// Player to act.
        player: Player,
    },
    /// Dice were rolled.
    DiceRolled {
        /// Player who rolled.
        player: Player,
        /// The roll.
        roll: Roll,
    },
    /// A checker moved.
    MoveApplied {
        /// Player who moved.
        player: Player,
        /// The move as played.
        mv: Move,
        /// The move in interchange notation.
        notation: String,
    },
    /// A double was offered.
    CubeOffered {
        /// Player who doubled.
        player: Player,
        /// Value the cube would show if taken.
        value: u32,
    },
    /// A double was taken or passed.
    CubeResolved(CubeResolution),
    /// A player's turn finished.
    TurnEnded {
        /// Player whose turn ended.
        player: Player,
    },
    /// A turn was ended from outside, such as by a clock.
    TurnForfeited {
        /// Player who forfeited.
        player: Player,
    },
    /// The game is over.
    GameEnded {
        /// Winner of the game.
        winner: Player,
        /// Level the points were computed with.
        gammon_level: GammonLevel,
        /// Points the winner receives.
        points_awarded: u32,
        /// How the game ended.
        reason: EndReason,
    },
    /// The match is over.
    MatchEnded {
        /// Winner of the match.
        winner: Player,
    },
}
