//! Strictly Backgammon - a deterministic backgammon match engine
//!
//! The engine keeps board state, generates and validates legal moves under
//! dice constraints, and runs the doubling cube and match scoring. It does no
//! I/O: callers feed it rolls and moves and drain the events it produces.
//!
//! # Architecture
//!
//! - **Board**: 24 signed point slots plus bar and borne-off counts
//! - **Generator**: maximal dice usage across every move ordering
//! - **Turn**: roll, incremental move commitment, hand-off
//! - **Cube**: offer, take, pass, ownership and the Crawford gate
//! - **Scoring**: gammons, the Jacoby rule and match completion
//! - **Notation**: `13/8*` style move tokens
//!
//! # Example
//!
//! ```
//! use strictly_backgammon::{MatchRules, MatchSession, Player, Roll};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = MatchSession::new(MatchRules::match_to(5), Player::White)?;
//! session.roll(Roll::new(3, 1).ok_or("bad roll")?)?;
//! session.commit_notation("17/20")?;
//! session.commit_notation("19/20")?;
//! assert_eq!(session.game().turn().player(), Player::Black);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod board;
mod config;
mod cube;
mod dice;
mod error;
mod events;
mod game;
mod invariants;
mod match_state;
mod movegen;
mod notation;
mod scoring;
mod session;
mod snapshot;
mod turn;
mod types;

// Crate-level exports - Core types
pub use types::{CHECKERS_PER_PLAYER, Destination, Move, POINTS, Player, Source};

// Crate-level exports - Board and dice
pub use board::Board;
pub use dice::{DiceRoller, DieSet, FixedDice, RandomDice, Roll};

// Crate-level exports - Move generation and turns
pub use movegen::{MoveSequences, maximal_sequences, single_moves};
pub use turn::{TurnPhase, TurnState};

// Crate-level exports - Cube and scoring
pub use cube::{Cube, CubeOwner, CubeResolution, CubeState, OfferContext};
pub use match_state::{MatchStanding, MatchState};
pub use scoring::{
    EndReason, GameOutcome, GammonLevel, ResignationKind, effective_level, points_awarded,
};

// Crate-level exports - Games, sessions and persistence
pub use events::GameEvent;
pub use game::Game;
pub use session::MatchSession;
pub use snapshot::{GameSnapshot, SessionSnapshot};

// Crate-level exports - Notation
pub use notation::{decode, decode_sequence, encode, encode_sequence};

// Crate-level exports - Configuration and errors
pub use config::{ConfigError, MatchRules};
pub use error::{DoubleRefusal, GameError, IllegalMoveReason, NotationError};

// Crate-level exports - Invariants
pub use invariants::{
    BoardInvariants, CheckerConservationInvariant, CubeInvariants, CubeValueInvariant, Invariant,
    InvariantSet, InvariantViolation, SingleColorPointInvariant,
};
