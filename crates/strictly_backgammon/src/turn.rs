//! Turn state machine: roll, incremental move commitment, hand-off.
//!
//! `AwaitingRoll → AwaitingMove → TurnComplete → (opponent) AwaitingRoll`.
//! Every committed move is checked against the maximal sequences the
//! generator computes for the position as it stands, so a move that would
//! strand a playable die is refused before anything changes.

use crate::board::Board;
use crate::dice::{DieSet, Roll};
use crate::error::{GameError, IllegalMoveReason};
use crate::movegen::{MoveSequences, maximal_sequences};
use crate::types::{Move, Player};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Phase of the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum TurnPhase {
    /// The player may double or roll.
    AwaitingRoll,
    /// Dice are rolled and at least one die can still be played.
    AwaitingMove,
    /// Nothing left to play; the turn passes to the opponent.
    TurnComplete,
}

/// State of one player's turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TurnState {
    player: Player,
    phase: TurnPhase,
    roll: Option<Roll>,
    dice: DieSet,
    moves_applied: Vec<Move>,
    /// Dice the maximal sequences used when the roll was made.
    max_dice: usize,
    #[serde(skip)]
    #[schemars(skip)]
    legal: MoveSequences,
}

impl TurnState {
    /// A fresh turn waiting for `player` to roll.
    pub fn new(player: Player) -> Self {
        Self {
            player,
            phase: TurnPhase::AwaitingRoll,
            roll: None,
            dice: DieSet::default(),
            moves_applied: Vec::new(),
            max_dice: 0,
            legal: MoveSequences::default(),
        }
    }

    /// Player whose turn it is.
    pub fn player(&self) -> Player {
        self.player
    }

    /// Current phase.
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// The roll of this turn, once made.
    pub fn roll(&self) -> Option<Roll> {
        self.roll
    }

    /// Dice still unused.
    pub fn dice(&self) -> &DieSet {
        &self.dice
    }

    /// Moves committed so far this turn.
    pub fn moves_applied(&self) -> &[Move] {
        &self.moves_applied
    }

    /// Dice count the roll obliged the player to use.
    pub fn max_dice(&self) -> usize {
        self.max_dice
    }

    /// Maximal continuations from the current position.
    pub fn legal(&self) -> &MoveSequences {
        &self.legal
    }

    /// Moves that may be committed next.
    pub fn legal_moves(&self) -> Vec<Move> {
        match self.phase {
            TurnPhase::AwaitingMove => self.legal.first_moves(),
            _ => Vec::new(),
        }
    }

    fn require(&self, phase: TurnPhase, operation: &'static str) -> Result<(), GameError> {
        if self.phase == phase {
            Ok(())
        } else {
            warn!(operation, phase = ?self.phase, "Operation out of turn");
            Err(GameError::OutOfTurn {
                operation,
                phase: self.phase,
            })
        }
    }

    /// Records the roll and computes the maximal sequences.
    ///
    /// When no die can be played the turn completes at once.
    #[instrument(skip(self, board), fields(player = %self.player))]
    pub fn apply_roll(&mut self, board: &Board, roll: Roll) -> Result<(), GameError> {
        self.require(TurnPhase::AwaitingRoll, "roll")?;

        let dice = DieSet::from_roll(roll);
        let legal = maximal_sequences(board, self.player, &dice);

        self.max_dice = legal.max_dice();
        self.phase = if legal.is_empty() {
            debug!(%roll, "No legal move; turn passes");
            TurnPhase::TurnComplete
        } else {
            TurnPhase::AwaitingMove
        };
        self.roll = Some(roll);
        self.dice = dice;
        self.legal = legal;
        Ok(())
    }

    /// Validates `requested` against the maximal sequences and plays it.
    ///
    /// Returns the board after the move and the move as played, with the hit
    /// flag from the board and a bear-off die reconciled. On error nothing
    /// changes.
    #[instrument(skip(self, board), fields(player = %self.player))]
    pub fn commit_move(
        &mut self,
        board: &Board,
        requested: &Move,
    ) -> Result<(Board, Move), GameError> {
        self.require(TurnPhase::AwaitingMove, "commit_move")?;

        let Some(chosen) = self.legal.match_first(requested) else {
            return Err(self.classify_rejection(board, requested));
        };

        let next = board.apply_single_move(&chosen, self.player)?;
        let Some(rest) = self.dice.without(chosen.die) else {
            return Err(GameError::IllegalMove {
                attempted: *requested,
                reason: IllegalMoveReason::DieUnavailable(chosen.die),
            });
        };

        let continuation = maximal_sequences(&next, self.player, &rest);
        let consumed = self.moves_applied.len() + 1;
        if continuation.max_dice() + consumed != self.max_dice {
            warn!(
                expected = self.max_dice - consumed,
                reachable = continuation.max_dice(),
                "Move forecloses maximal dice usage"
            );
            return Err(GameError::ForcedUsage {
                attempted: *requested,
                alternatives: self.legal.first_moves(),
            });
        }

        self.dice = rest;
        self.moves_applied.push(chosen);
        if continuation.is_empty() {
            self.phase = TurnPhase::TurnComplete;
        }
        self.legal = continuation;
        debug!(%chosen, remaining = self.dice.len(), "Move committed");
        Ok((next, chosen))
    }

    fn classify_rejection(&self, board: &Board, requested: &Move) -> GameError {
        if !self.dice.contains(requested.die) {
            return GameError::IllegalMove {
                attempted: *requested,
                reason: IllegalMoveReason::DieUnavailable(requested.die),
            };
        }
        match board.validate_move(self.player, requested) {
            Err(reason) => GameError::IllegalMove {
                attempted: *requested,
                reason,
            },
            Ok(_) => {
                warn!(%requested, "Move would strand a playable die");
                GameError::ForcedUsage {
                    attempted: *requested,
                    alternatives: self.legal.first_moves(),
                }
            }
        }
    }

    /// Ends the turn early, keeping moves already committed.
    #[instrument(skip(self), fields(player = %self.player))]
    pub fn forfeit(&mut self) -> Result<(), GameError> {
        if self.phase == TurnPhase::TurnComplete {
            return Err(GameError::OutOfTurn {
                operation: "forfeit_turn",
                phase: self.phase,
            });
        }
        self.phase = TurnPhase::TurnComplete;
        self.legal = MoveSequences::default();
        Ok(())
    }

    /// Passes a completed turn to the opponent.
    pub fn hand_off(&self) -> Result<TurnState, GameError> {
        self.require(TurnPhase::TurnComplete, "hand_off")?;
        Ok(TurnState::new(self.player.opponent()))
    }

    /// Rebuilds the derived move sequences after deserialization, rejecting
    /// a turn whose dice, moves and phase cannot belong together.
    pub(crate) fn rehydrate(&mut self, board: &Board) -> Result<(), GameError> {
        let corrupt = |what: &str| {
            warn!(what, "Corrupt turn state");
            GameError::InvariantViolation(format!("turn state: {what}"))
        };

        match (self.phase, self.roll) {
            (TurnPhase::AwaitingRoll, None) => {
                if !self.dice.is_empty() || !self.moves_applied.is_empty() {
                    return Err(corrupt("dice or moves recorded before the roll"));
                }
            }
            (TurnPhase::AwaitingRoll, Some(_)) => {
                return Err(corrupt("roll recorded while awaiting the roll"));
            }
            (_, None) => return Err(corrupt("no roll recorded")),
            (_, Some(roll)) => {
                let accounted: Vec<u8> = self
                    .moves_applied
                    .iter()
                    .map(|mv| mv.die)
                    .chain(self.dice.values().iter().copied())
                    .collect();
                if DieSet::from_values(accounted) != DieSet::from_roll(roll) {
                    return Err(corrupt("dice do not match the roll"));
                }
            }
        }

        self.legal = match self.phase {
            TurnPhase::AwaitingMove => maximal_sequences(board, self.player, &self.dice),
            _ => MoveSequences::default(),
        };
        if self.phase == TurnPhase::AwaitingMove
            && (self.legal.is_empty()
                || self.legal.max_dice() + self.moves_applied.len() != self.max_dice)
        {
            return Err(corrupt("remaining dice do not match the maximal usage"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tests::board_with;
    use crate::types::{Destination, Source};

    fn roll(a: u8, b: u8) -> Roll {
        Roll::new(a, b).unwrap()
    }

    fn mv(from: usize, to: usize, die: u8) -> Move {
        Move::new(Source::Point(from), Destination::Point(to), die, false)
    }

    #[test]
    fn test_roll_twice_is_out_of_turn() {
        let board = Board::initial();
        let mut turn = TurnState::new(Player::White);
        turn.apply_roll(&board, roll(3, 1)).unwrap();
        assert_eq!(turn.phase(), TurnPhase::AwaitingMove);
        let err = turn.apply_roll(&board, roll(3, 1)).unwrap_err();
        assert!(matches!(err, GameError::OutOfTurn { operation: "roll", .. }));
    }

    #[test]
    fn test_move_before_roll_is_out_of_turn() {
        let board = Board::initial();
        let mut turn = TurnState::new(Player::White);
        let err = turn.commit_move(&board, &mv(0, 3, 3)).unwrap_err();
        assert!(matches!(err, GameError::OutOfTurn { .. }));
    }

    #[test]
    fn test_full_turn_then_hand_off() {
        let board = Board::initial();
        let mut turn = TurnState::new(Player::White);
        turn.apply_roll(&board, roll(3, 1)).unwrap();
        let (board, _) = turn.commit_move(&board, &mv(16, 19, 3)).unwrap();
        assert_eq!(turn.phase(), TurnPhase::AwaitingMove);
        let (_, _) = turn.commit_move(&board, &mv(18, 19, 1)).unwrap();
        assert_eq!(turn.phase(), TurnPhase::TurnComplete);
        assert_eq!(turn.moves_applied().len(), 2);

        let next = turn.hand_off().unwrap();
        assert_eq!(next.player(), Player::Black);
        assert_eq!(next.phase(), TurnPhase::AwaitingRoll);
    }

    #[test]
    fn test_forced_usage_leaves_state_untouched() {
        let board = board_with(&[(2, 1), (10, 1), (8, -2), (17, -2)], [0, 0]);
        let mut turn = TurnState::new(Player::White);
        turn.apply_roll(&board, roll(6, 1)).unwrap();
        let before = turn.clone();

        let err = turn.commit_move(&board, &mv(10, 11, 1)).unwrap_err();
        match err {
            GameError::ForcedUsage { alternatives, .. } => {
                assert!(alternatives.contains(&mv(2, 3, 1)));
                assert!(alternatives.contains(&mv(10, 16, 6)));
            }
            other => panic!("expected forced usage, got {other:?}"),
        }
        assert_eq!(turn, before);
    }

    #[test]
    fn test_blocked_move_is_illegal_not_forced() {
        let board = board_with(&[(2, 1), (10, 1), (8, -2), (17, -2)], [0, 0]);
        let mut turn = TurnState::new(Player::White);
        turn.apply_roll(&board, roll(6, 1)).unwrap();
        let err = turn.commit_move(&board, &mv(2, 8, 6)).unwrap_err();
        assert!(matches!(
            err,
            GameError::IllegalMove {
                reason: IllegalMoveReason::DestinationBlocked(_),
                ..
            }
        ));
    }

    #[test]
    fn test_unrolled_die_is_unavailable() {
        let board = Board::initial();
        let mut turn = TurnState::new(Player::White);
        turn.apply_roll(&board, roll(3, 1)).unwrap();
        let err = turn.commit_move(&board, &mv(0, 5, 5)).unwrap_err();
        assert!(matches!(
            err,
            GameError::IllegalMove {
                reason: IllegalMoveReason::DieUnavailable(5),
                ..
            }
        ));
    }

    #[test]
    fn test_die_must_match_the_path() {
        let board = Board::initial();
        let mut turn = TurnState::new(Player::White);
        turn.apply_roll(&board, roll(3, 1)).unwrap();
        let before = turn.clone();

        // 17/20 played with the 1: the path needs a 3.
        let err = turn.commit_move(&board, &mv(16, 19, 1)).unwrap_err();
        assert!(matches!(
            err,
            GameError::IllegalMove {
                reason: IllegalMoveReason::WrongDirection,
                ..
            }
        ));
        assert!(board.apply_single_move(&mv(16, 19, 1), Player::White).is_err());

        // Same path with a die that was never rolled.
        assert!(turn.commit_move(&board, &mv(16, 19, 5)).is_err());
        assert_eq!(turn, before);

        let (_, played) = turn.commit_move(&board, &mv(16, 19, 3)).unwrap();
        assert_eq!(played.die, 3);
    }

    #[test]
    fn test_dance_completes_turn_immediately() {
        let blocks: Vec<(usize, i8)> = (0..6).map(|i| (i, -2)).collect();
        let board = board_with(&blocks, [1, 0]);
        let mut turn = TurnState::new(Player::White);
        turn.apply_roll(&board, roll(4, 2)).unwrap();
        assert_eq!(turn.phase(), TurnPhase::TurnComplete);
        assert!(turn.legal_moves().is_empty());
    }

    #[test]
    fn test_forfeit_keeps_committed_moves() {
        let board = Board::initial();
        let mut turn = TurnState::new(Player::White);
        turn.apply_roll(&board, roll(3, 1)).unwrap();
        turn.commit_move(&board, &mv(16, 19, 3)).unwrap();
        turn.forfeit().unwrap();
        assert_eq!(turn.phase(), TurnPhase::TurnComplete);
        assert_eq!(turn.moves_applied().len(), 1);
        assert!(turn.forfeit().is_err());
    }

    #[test]
    fn test_rehydrate_rebuilds_sequences() {
        let board = Board::initial();
        let mut turn = TurnState::new(Player::White);
        turn.apply_roll(&board, roll(3, 1)).unwrap();
        let (board, _) = turn.commit_move(&board, &mv(16, 19, 3)).unwrap();

        let json = serde_json::to_string(&turn).unwrap();
        let mut restored: TurnState = serde_json::from_str(&json).unwrap();
        assert!(restored.legal().is_empty());
        restored.rehydrate(&board).unwrap();
        assert_eq!(restored, turn);
    }

    #[test]
    fn test_rehydrate_rejects_foreign_dice() {
        let board = Board::initial();
        let mut turn = TurnState::new(Player::White);
        turn.apply_roll(&board, roll(3, 1)).unwrap();
        turn.dice = DieSet::from_values(vec![6, 1]);
        assert!(matches!(
            turn.rehydrate(&board),
            Err(GameError::InvariantViolation(_))
        ));
    }
}
