//! Checker conservation: every player always owns exactly 15 checkers.

use super::Invariant;
use crate::board::Board;
use crate::types::{CHECKERS_PER_PLAYER, Player};
use strum::IntoEnumIterator;

/// Invariant: checkers on points + bar + off == 15 for each player.
pub struct CheckerConservationInvariant;

impl Invariant<Board> for CheckerConservationInvariant {
    fn holds(board: &Board) -> bool {
        Player::iter().all(|player| {
            let on_points: u32 = board
                .points()
                .iter()
                .filter(|slot| slot.signum() == player.sign())
                .map(|slot| u32::from(slot.unsigned_abs()))
                .sum();
            on_points + u32::from(board.bar(player)) + u32::from(board.off(player))
                == u32::from(CHECKERS_PER_PLAYER)
        })
    }

    fn description() -> &'static str {
        "Each player owns exactly 15 checkers across points, bar and off"
    }
}
