//! Legal move generation under dice constraints.
//!
//! A player must use as many dice as any ordering of them allows. Playing
//! one die first can open or close options for another, so the generator
//! searches every order of die application depth-first (at most four
//! plies) and keeps only the sequences reaching the maximal dice count.

use crate::board::Board;
use crate::dice::DieSet;
use crate::types::{Destination, Move, Player, Source};
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Maximal legal move sequences for one position and set of dice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveSequences {
    max_dice: usize,
    sequences: Vec<Vec<Move>>,
}

impl MoveSequences {
    /// Greatest number of dice any legal sequence uses.
    pub fn max_dice(&self) -> usize {
        self.max_dice
    }

    /// Every legal sequence, each of length `max_dice`.
    pub fn sequences(&self) -> &[Vec<Move>] {
        &self.sequences
    }

    /// True when no die can be played at all.
    pub fn is_empty(&self) -> bool {
        self.max_dice == 0
    }

    /// Distinct moves that open some maximal sequence, in discovery order.
    pub fn first_moves(&self) -> Vec<Move> {
        let mut seen = HashSet::new();
        self.sequences
            .iter()
            .filter_map(|seq| seq.first().copied())
            .filter(|mv| seen.insert(*mv))
            .collect()
    }

    /// True if `sequence` is one of the maximal sequences.
    pub fn contains(&self, sequence: &[Move]) -> bool {
        self.sequences.iter().any(|seq| seq.as_slice() == sequence)
    }

    /// Finds the legal opening move matching `requested` by path.
    ///
    /// The hit flag always comes from the board. A point or bar move must
    /// name the die it plays. When several dice bear the same checker off,
    /// the requested die wins, otherwise the smallest one.
    pub fn match_first(&self, requested: &Move) -> Option<Move> {
        let candidates: Vec<Move> = self
            .first_moves()
            .into_iter()
            .filter(|mv| mv.same_path(requested))
            .collect();
        let exact = candidates.iter().find(|mv| mv.die == requested.die);
        match requested.to {
            Destination::Off => exact.or_else(|| candidates.iter().min_by_key(|mv| mv.die)),
            Destination::Point(_) => exact,
        }
        .copied()
    }
}

/// Locally legal single-die moves, ignoring what they do to later dice.
///
/// Checkers on the bar must enter before anything else moves.
pub fn single_moves(board: &Board, player: Player, dice: &DieSet) -> Vec<Move> {
    let sources: Vec<Source> = if board.bar(player) > 0 {
        vec![Source::Bar]
    } else {
        board.occupied_by(player).map(Source::Point).collect()
    };

    dice.distinct()
        .into_iter()
        .flat_map(|die| sources.iter().map(move |&source| (source, die)))
        .filter_map(|(source, die)| board.resolve_move(player, source, die).ok())
        .collect()
}

/// Enumerates every maximal legal move sequence.
///
/// When only one die of a non-double roll can be played, the larger one
/// must be played if any sequence allows it.
#[instrument(skip(board))]
pub fn maximal_sequences(board: &Board, player: Player, dice: &DieSet) -> MoveSequences {
    let mut search = Search {
        player,
        best: 0,
        found: Vec::new(),
        path: Vec::with_capacity(dice.len()),
    };
    search.descend(board, dice);

    let mut seen = HashSet::new();
    let mut sequences: Vec<Vec<Move>> = search
        .found
        .into_iter()
        .filter(|seq| seen.insert(seq.clone()))
        .collect();

    let values = dice.values();
    if search.best == 1 && values.len() == 2 && values[0] != values[1] {
        let high = values[0];
        if sequences.iter().any(|seq| seq[0].die == high) {
            sequences.retain(|seq| seq[0].die == high);
        }
    }

    debug!(
        max_dice = search.best,
        sequences = sequences.len(),
        "Generated maximal sequences"
    );

    MoveSequences {
        max_dice: search.best,
        sequences,
    }
}

/// Depth-first search state over die orderings.
struct Search {
    player: Player,
    best: usize,
    found: Vec<Vec<Move>>,
    path: Vec<Move>,
}

impl Search {
    fn descend(&mut self, board: &Board, dice: &DieSet) {
        let moves = single_moves(board, self.player, dice);
        if moves.is_empty() {
            self.record();
            return;
        }

        for mv in moves {
            let Some(rest) = dice.without(mv.die) else {
                continue;
            };
            let mut next = *board;
            next.apply_unchecked(&mv, self.player);
            self.path.push(mv);
            self.descend(&next, &rest);
            self.path.pop();
        }
    }

    fn record(&mut self) {
        let len = self.path.len();
        if len > self.best {
            self.best = len;
            self.found.clear();
        }
        if len == self.best && len > 0 {
            self.found.push(self.path.clone());
        }
    }
}
