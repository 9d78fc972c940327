//! Core domain types for backgammon.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Number of points on the board.
pub const POINTS: usize = 24;

/// Checkers each player owns for the whole game.
pub const CHECKERS_PER_PLAYER: u8 = 15;

/// Player in the game.
///
/// White owns the positive slots and moves from index 0 towards 23.
/// Black owns the negative slots and moves from index 23 towards 0.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
    strum::EnumIter,
    strum::Display,
)]
pub enum Player {
    /// Ascending player (moves 0 → 23).
    White,
    /// Descending player (moves 23 → 0).
    Black,
}

impl Player {
    /// Returns the opponent player.
    pub fn opponent(self) -> Self {
        match self {
            Player::White => Player::Black,
            Player::Black => Player::White,
        }
    }

    /// Sign of this player's checkers in a board slot.
    pub fn sign(self) -> i8 {
        match self {
            Player::White => 1,
            Player::Black => -1,
        }
    }

    /// Slot index used for per-player arrays (bar, off, score).
    pub fn index(self) -> usize {
        match self {
            Player::White => 0,
            Player::Black => 1,
        }
    }

    /// Board indices forming this player's home board.
    pub fn home(self) -> RangeInclusive<usize> {
        match self {
            Player::White => 18..=23,
            Player::Black => 0..=5,
        }
    }

    /// Index where a checker enters from the bar with the given die.
    ///
    /// Entry happens inside the opponent's home board.
    pub fn entry_point(self, die: u8) -> usize {
        match self {
            Player::White => usize::from(die) - 1,
            Player::Black => POINTS - usize::from(die),
        }
    }

    /// Pips a checker at `index` still has to travel to be borne off.
    ///
    /// Inside the home board this is the home point number (1-6).
    pub fn pips_to_off(self, index: usize) -> u8 {
        match self {
            Player::White => (POINTS - index) as u8,
            Player::Black => (index + 1) as u8,
        }
    }

    /// Index reached by moving `die` pips from `index`, or `None` past the edge.
    pub fn advance(self, index: usize, die: u8) -> Option<usize> {
        let die = usize::from(die);
        match self {
            Player::White => Some(index + die).filter(|&to| to < POINTS),
            Player::Black => index.checked_sub(die),
        }
    }
}

/// Where a checker is moved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Source {
    /// The player's bar.
    Bar,
    /// A board point, by index (0-23).
    Point(usize),
}

/// Where a checker is moved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Destination {
    /// A board point, by index (0-23).
    Point(usize),
    /// Borne off.
    Off,
}

/// A single-die checker movement.
///
/// Moves are domain events: they can be validated before application,
/// serialized for replay and rendered in interchange notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Move {
    /// Origin of the checker.
    pub from: Source,
    /// Destination of the checker.
    pub to: Destination,
    /// Die value consumed (1-6).
    pub die: u8,
    /// Whether the move hits a lone opposing checker.
    pub is_hit: bool,
}

impl Move {
    /// Creates a new move.
    pub fn new(from: Source, to: Destination, die: u8, is_hit: bool) -> Self {
        Self {
            from,
            to,
            die,
            is_hit,
        }
    }

    /// Returns true if this move bears a checker off.
    pub fn is_bear_off(&self) -> bool {
        self.to == Destination::Off
    }

    /// Returns true if both moves travel the same path, ignoring die and hit flag.
    pub fn same_path(&self, other: &Move) -> bool {
        self.from == other.from && self.to == other.to
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", crate::notation::encode(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_points_mirror() {
        assert_eq!(Player::White.entry_point(1), 0);
        assert_eq!(Player::White.entry_point(6), 5);
        assert_eq!(Player::Black.entry_point(1), 23);
        assert_eq!(Player::Black.entry_point(6), 18);
    }

    #[test]
    fn test_pips_to_off() {
        assert_eq!(Player::White.pips_to_off(23), 1);
        assert_eq!(Player::White.pips_to_off(18), 6);
        assert_eq!(Player::Black.pips_to_off(0), 1);
        assert_eq!(Player::Black.pips_to_off(5), 6);
    }

    #[test]
    fn test_advance_stops_at_edge() {
        assert_eq!(Player::White.advance(20, 3), Some(23));
        assert_eq!(Player::White.advance(20, 4), None);
        assert_eq!(Player::Black.advance(3, 3), Some(0));
        assert_eq!(Player::Black.advance(3, 4), None);
    }

    #[test]
    fn test_home_contains_entry_of_opponent() {
        for die in 1..=6 {
            assert!(Player::Black.home().contains(&Player::White.entry_point(die)));
            assert!(Player::White.home().contains(&Player::Black.entry_point(die)));
        }
    }
}
