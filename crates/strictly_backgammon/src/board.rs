//! Board model: 24 signed point slots plus bar and borne-off counts.

use crate::error::{GameError, IllegalMoveReason};
use crate::invariants::{BoardInvariants, InvariantSet};
use crate::types::{CHECKERS_PER_PLAYER, Destination, Move, POINTS, Player, Source};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

/// Backgammon board.
///
/// Positive slots hold White checkers, negative slots hold Black checkers,
/// so a point can never hold both colors at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Board {
    /// Signed checker counts per point (index 0-23).
    points: [i8; POINTS],
    /// Hit checkers awaiting re-entry, indexed by `Player::index`.
    bar: [u8; 2],
    /// Borne-off checkers, indexed by `Player::index`.
    off: [u8; 2],
}

impl Board {
    /// Creates the standard starting position.
    pub fn initial() -> Self {
        let mut points = [0i8; POINTS];
        for (index, count) in [(0, 2), (11, 5), (16, 3), (18, 5)] {
            points[index] = count;
            points[POINTS - 1 - index] = -count;
        }
        Self {
            points,
            bar: [0, 0],
            off: [0, 0],
        }
    }

    /// Builds a board from raw parts, rejecting anything that breaks the checker invariants.
    #[instrument]
    pub fn from_parts(
        points: [i8; POINTS],
        bar: [u8; 2],
        off: [u8; 2],
    ) -> Result<Self, GameError> {
        let board = Self { points, bar, off };
        board.verify()?;
        Ok(board)
    }

    /// Checks every board invariant.
    pub fn verify(&self) -> Result<(), GameError> {
        BoardInvariants::check_all(self).map_err(|violations| {
            let descriptions = violations
                .iter()
                .map(|v| v.description.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            warn!(%descriptions, "Board invariant violated");
            GameError::InvariantViolation(descriptions)
        })
    }

    /// Raw signed slot value at `index`.
    pub fn slot(&self, index: usize) -> i8 {
        self.points.get(index).copied().unwrap_or(0)
    }

    /// All slots in index order.
    pub fn points(&self) -> &[i8; POINTS] {
        &self.points
    }

    /// Player owning the checkers at `index`, if any.
    pub fn owner_at(&self, index: usize) -> Option<Player> {
        match self.slot(index) {
            0 => None,
            s if s > 0 => Some(Player::White),
            _ => Some(Player::Black),
        }
    }

    /// Number of `player`'s checkers at `index`.
    pub fn checkers_at(&self, index: usize, player: Player) -> u8 {
        let slot = self.slot(index) * player.sign();
        if slot > 0 { slot as u8 } else { 0 }
    }

    /// Checkers `player` has on the bar.
    pub fn bar(&self, player: Player) -> u8 {
        self.bar[player.index()]
    }

    /// Checkers `player` has borne off.
    pub fn off(&self, player: Player) -> u8 {
        self.off[player.index()]
    }

    /// Checkers `player` has on the 24 points.
    pub fn checkers_on_points(&self, player: Player) -> u8 {
        (0..POINTS).map(|i| self.checkers_at(i, player)).sum()
    }

    /// Indices holding at least one of `player`'s checkers.
    pub fn occupied_by(&self, player: Player) -> impl Iterator<Item = usize> + '_ {
        (0..POINTS).filter(move |&i| self.checkers_at(i, player) > 0)
    }

    /// True if `player` cannot land on `index` (two or more opposing checkers).
    pub fn is_blocked_for(&self, index: usize, player: Player) -> bool {
        self.checkers_at(index, player.opponent()) >= 2
    }

    /// True iff `player` has nothing on the bar and nothing outside the home board.
    pub fn can_bear_off(&self, player: Player) -> bool {
        let home = player.home();
        self.bar(player) == 0 && self.occupied_by(player).all(|i| home.contains(&i))
    }

    /// True if `player` has a checker on a home point higher than the one at `index`.
    pub fn has_checker_farther(&self, player: Player, index: usize) -> bool {
        let pips = player.pips_to_off(index);
        self.occupied_by(player)
            .filter(|i| player.home().contains(i))
            .any(|i| player.pips_to_off(i) > pips)
    }

    /// True once all of `player`'s checkers are borne off.
    pub fn has_borne_off_all(&self, player: Player) -> bool {
        self.off(player) == CHECKERS_PER_PLAYER
    }

    /// Pips `player` needs to bear every checker off; bar checkers count 25.
    pub fn pip_count(&self, player: Player) -> u32 {
        let on_points: u32 = self
            .occupied_by(player)
            .map(|i| u32::from(self.checkers_at(i, player)) * u32::from(player.pips_to_off(i)))
            .sum();
        on_points + u32::from(self.bar(player)) * 25
    }

    /// Works out the move that plays `die` from `source`, checking every single-move rule.
    ///
    /// Bar checkers take precedence, blocked points are refused, and a bear-off
    /// with a larger die is allowed only from the highest occupied home point.
    pub fn resolve_move(
        &self,
        player: Player,
        source: Source,
        die: u8,
    ) -> Result<Move, IllegalMoveReason> {
        if !(1..=6).contains(&die) {
            return Err(IllegalMoveReason::InvalidDie(die));
        }

        let target = match source {
            Source::Bar => {
                if self.bar(player) == 0 {
                    return Err(IllegalMoveReason::NoCheckerAtSource(source));
                }
                Some(player.entry_point(die))
            }
            Source::Point(index) => {
                if index >= POINTS {
                    return Err(IllegalMoveReason::PointOutOfRange(index));
                }
                if self.bar(player) > 0 {
                    return Err(IllegalMoveReason::MustEnterFromBar);
                }
                if self.checkers_at(index, player) == 0 {
                    return Err(IllegalMoveReason::NoCheckerAtSource(source));
                }
                player.advance(index, die)
            }
        };

        match (source, target) {
            (_, Some(to)) => {
                if self.is_blocked_for(to, player) {
                    return Err(IllegalMoveReason::DestinationBlocked(Destination::Point(to)));
                }
                let is_hit = self.checkers_at(to, player.opponent()) == 1;
                Ok(Move::new(source, Destination::Point(to), die, is_hit))
            }
            (Source::Point(index), None) => {
                if !self.can_bear_off(player) {
                    return Err(IllegalMoveReason::BearOffNotAllowed);
                }
                if die > player.pips_to_off(index) && self.has_checker_farther(player, index) {
                    return Err(IllegalMoveReason::OverageNotAllowed);
                }
                Ok(Move::new(source, Destination::Off, die, false))
            }
            (Source::Bar, None) => Err(IllegalMoveReason::WrongDirection),
        }
    }

    /// Validates a caller-supplied move, returning it with the hit flag taken from the board.
    pub fn validate_move(&self, player: Player, mv: &Move) -> Result<Move, IllegalMoveReason> {
        let resolved = self.resolve_move(player, mv.from, mv.die)?;
        if resolved.to != mv.to {
            return Err(IllegalMoveReason::WrongDirection);
        }
        Ok(resolved)
    }

    /// Applies one single-die move, returning the new board.
    ///
    /// At most one slot pair changes: the source loses a checker, the destination
    /// gains one, and a lone opposing checker there goes to its owner's bar.
    #[instrument(skip(self))]
    pub fn apply_single_move(&self, mv: &Move, player: Player) -> Result<Board, GameError> {
        let checked = self.validate_move(player, mv).map_err(|reason| {
            warn!(%reason, "Rejected single move");
            GameError::IllegalMove {
                attempted: *mv,
                reason,
            }
        })?;
        let mut next = *self;
        next.apply_unchecked(&checked, player);
        Ok(next)
    }

    /// Applies a move already validated against this board.
    pub(crate) fn apply_unchecked(&mut self, mv: &Move, player: Player) {
        let sign = player.sign();
        match mv.from {
            Source::Bar => self.bar[player.index()] -= 1,
            Source::Point(index) => self.points[index] -= sign,
        }
        match mv.to {
            Destination::Off => self.off[player.index()] += 1,
            Destination::Point(index) => {
                if self.points[index] == -sign {
                    self.points[index] = 0;
                    self.bar[player.opponent().index()] += 1;
                }
                self.points[index] += sign;
            }
        }
    }

    /// Formats the board as a human-readable string.
    pub fn display(&self) -> String {
        let cell = |i: usize| match self.slot(i) {
            0 => "  .".to_string(),
            s if s > 0 => format!("{:>2}W", s),
            s => format!("{:>2}B", -s),
        };
        let top: Vec<String> = (12..POINTS).map(cell).collect();
        let bottom: Vec<String> = (0..12).rev().map(cell).collect();
        format!(
            "13-24 |{}|\n12-1  |{}|\nbar W{} B{}  off W{} B{}",
            top.join(" "),
            bottom.join(" "),
            self.bar(Player::White),
            self.bar(Player::Black),
            self.off(Player::White),
            self.off(Player::Black),
        )
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::initial()
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}
