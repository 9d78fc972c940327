//! Error kinds surfaced by the engine.
//!
//! Every error is locally recoverable. Operations that fail leave the
//! board, cube and turn state exactly as they were before the call.

use crate::turn::TurnPhase;
use crate::types::{Destination, Move, Source};

/// Why a single move cannot be played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum IllegalMoveReason {
    /// The source holds no checker of the mover's color.
    #[display("no checker at {:?}", _0)]
    NoCheckerAtSource(Source),

    /// The destination holds two or more opposing checkers.
    #[display("destination {:?} is blocked", _0)]
    DestinationBlocked(Destination),

    /// Source, destination and die do not describe a forward move.
    #[display("move does not travel forward by the die value")]
    WrongDirection,

    /// Checkers on the bar must be entered first.
    #[display("checkers on the bar must enter first")]
    MustEnterFromBar,

    /// Not every checker is home yet.
    #[display("bearing off requires all checkers in the home board")]
    BearOffNotAllowed,

    /// A larger die may only bear off from the highest occupied point.
    #[display("a checker sits on a higher home point")]
    OverageNotAllowed,

    /// The die is not among the unused dice.
    #[display("die {} is not available", _0)]
    DieUnavailable(u8),

    /// Die values are 1 to 6.
    #[display("invalid die value {}", _0)]
    InvalidDie(u8),

    /// Board indices are 0 to 23.
    #[display("point index {} is out of range", _0)]
    PointOutOfRange(usize),
}

/// Why a double cannot be offered or answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum DoubleRefusal {
    /// Doubling is forbidden during the Crawford game.
    #[display("doubling is not allowed in the Crawford game")]
    CrawfordGame,

    /// Only the cube owner (or anyone, when centered) may double.
    #[display("the opponent owns the cube")]
    OpponentOwnsCube,

    /// A double is already awaiting an answer.
    #[display("a double is already pending")]
    OfferPending,

    /// The trailer may not double before their second roll of a post-Crawford game.
    #[display("the trailer may not double before their second roll after the Crawford game")]
    HollandRule,

    /// The offerer's score plus the cube value already reaches the match length.
    #[display("the cube is dead: the current value already wins the match")]
    DeadCube,

    /// The cube cannot be turned any higher.
    #[display("the cube is at its maximum value")]
    CubeAtMaximum,

    /// There is no double to answer.
    #[display("no double is pending")]
    NoOfferPending,
}

/// Malformed interchange notation.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum NotationError {
    /// Nothing to decode.
    #[display("empty move token")]
    Empty,

    /// The token has no `/` between source and destination.
    #[display("missing '/' separator in {:?}", _0)]
    MissingSeparator(String),

    /// A point is neither a number from 1 to 24 nor `bar`/`off`.
    #[display("invalid point {:?}", _0)]
    InvalidPoint(String),

    /// The bar can only be a source.
    #[display("bar cannot be a destination")]
    BarAsDestination,

    /// Off can only be a destination.
    #[display("off cannot be a source")]
    OffAsSource,

    /// The move runs against the player's direction.
    #[display("move runs against the player's direction")]
    WrongDirection,

    /// The distance does not correspond to a single die.
    #[display("distance {} cannot be played with one die", _0)]
    DistanceOutOfRange(u8),

    /// A bar entry must land in the opponent's home board.
    #[display("bar entry must land in the opponent's home board")]
    BarEntryOutOfRange,

    /// Bearing off happens only from the home board.
    #[display("bear-off source is outside the home board")]
    NotInHomeBoard,
}

impl std::error::Error for NotationError {}

/// Error returned by engine operations.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum GameError {
    /// The move breaks a board rule.
    #[display("illegal move {attempted:?}: {reason}")]
    IllegalMove {
        /// The rejected move.
        attempted: Move,
        /// The broken rule.
        reason: IllegalMoveReason,
    },

    /// The move is locally legal but strands a die some other play would use.
    #[display(
        "move {attempted} does not use the maximum number of dice ({} alternatives)",
        alternatives.len()
    )]
    ForcedUsage {
        /// The rejected move.
        attempted: Move,
        /// Moves that keep the maximal dice usage reachable.
        alternatives: Vec<Move>,
    },

    /// The operation is not valid in the current phase or for this player.
    #[display("{operation} is not allowed now (phase {phase:?})")]
    OutOfTurn {
        /// Operation that was attempted.
        operation: &'static str,
        /// Phase the turn was in.
        phase: TurnPhase,
    },

    /// The doubling cube refused the action.
    #[display("double not allowed: {}", _0)]
    DoubleNotAllowed(DoubleRefusal),

    /// Notation could not be decoded.
    #[display("notation error: {}", _0)]
    Notation(NotationError),

    /// A state check failed (corrupt snapshot or broken post-condition).
    #[display("invariant violation: {}", _0)]
    InvariantViolation(String),
}

impl std::error::Error for GameError {}

impl From<NotationError> for GameError {
    fn from(err: NotationError) -> Self {
        GameError::Notation(err)
    }
}

impl From<DoubleRefusal> for GameError {
    fn from(refusal: DoubleRefusal) -> Self {
        GameError::DoubleNotAllowed(refusal)
    }
}
