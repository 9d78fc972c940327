//! Single-color points: a point never mixes colors and never exceeds 15 checkers.

use super::Invariant;
use crate::board::Board;
use crate::types::CHECKERS_PER_PLAYER;

/// Invariant: each slot holds checkers of at most one color, at most 15 of them.
///
/// The signed encoding rules out mixed colors; the magnitude check catches
/// slots no legal sequence of moves could produce.
pub struct SingleColorPointInvariant;

impl Invariant<Board> for SingleColorPointInvariant {
    fn holds(board: &Board) -> bool {
        board
            .points()
            .iter()
            .all(|slot| slot.unsigned_abs() <= CHECKERS_PER_PLAYER)
    }

    fn description() -> &'static str {
        "Every point holds checkers of a single color, at most 15"
    }
}
