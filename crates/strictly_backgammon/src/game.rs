//! One game of backgammon: board, turn and cube under a set of match rules.
//!
//! A `Game` is a single-owner state machine. Every operation either succeeds
//! and queues the events it caused, or fails and leaves the game untouched.

use crate::board::Board;
use crate::config::MatchRules;
use crate::cube::{Cube, CubeResolution, OfferContext};
use crate::dice::{DiceRoller, Roll};
use crate::error::{DoubleRefusal, GameError};
use crate::events::GameEvent;
use crate::invariants::{CubeInvariants, InvariantSet};
use crate::match_state::MatchStanding;
use crate::movegen::MoveSequences;
use crate::notation;
use crate::scoring::{
    EndReason, GameOutcome, GammonLevel, ResignationKind, effective_level, points_awarded,
};
use crate::snapshot::GameSnapshot;
use crate::turn::{TurnPhase, TurnState};
use crate::types::{Move, Player};
use tracing::{debug, info, instrument, warn};

/// A game in progress or finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    board: Board,
    turn: TurnState,
    cube: Cube,
    rules: MatchRules,
    crawford_game: bool,
    standing: MatchStanding,
    rolls: [u32; 2],
    outcome: Option<GameOutcome>,
    events: Vec<GameEvent>,
}

impl Game {
    /// Starts a game from the standard position with `first` to roll.
    #[instrument]
    pub fn new(rules: MatchRules, crawford_game: bool, first: Player) -> Self {
        Self::start(Board::initial(), rules, crawford_game, first)
    }

    /// Starts a game from an arbitrary position, rejecting a board that
    /// breaks checker conservation or puts both colours on one point.
    #[instrument(skip(board))]
    pub fn with_board(
        board: Board,
        rules: MatchRules,
        crawford_game: bool,
        first: Player,
    ) -> Result<Self, GameError> {
        board.verify()?;
        Ok(Self::start(board, rules, crawford_game, first))
    }

    fn start(board: Board, rules: MatchRules, crawford_game: bool, first: Player) -> Self {
        debug!(%first, crawford_game, "Starting game");
        Self {
            board,
            turn: TurnState::new(first),
            cube: Cube::new(),
            rules,
            crawford_game,
            standing: MatchStanding::default(),
            rolls: [0, 0],
            outcome: None,
            events: vec![GameEvent::TurnStarted { player: first }],
        }
    }

    /// Same game with the match score it is played at.
    pub fn with_standing(mut self, standing: MatchStanding) -> Self {
        self.standing = standing;
        self
    }

    // ─── Queries ──────────────────────────────────────────────

    /// Current board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Current turn.
    pub fn turn(&self) -> &TurnState {
        &self.turn
    }

    /// Doubling cube.
    pub fn cube(&self) -> &Cube {
        &self.cube
    }

    /// Rules this game is scored under.
    pub fn rules(&self) -> &MatchRules {
        &self.rules
    }

    /// True if doubling is forbidden in this game.
    pub fn is_crawford_game(&self) -> bool {
        self.crawford_game
    }

    /// Match score when this game began.
    pub fn standing(&self) -> MatchStanding {
        self.standing
    }

    /// Rolls `player` has made this game.
    pub fn rolls(&self, player: Player) -> u32 {
        self.rolls[player.index()]
    }

    /// Result, once the game is over.
    pub fn outcome(&self) -> Option<&GameOutcome> {
        self.outcome.as_ref()
    }

    /// True once the game has a winner.
    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Player who must act next: the responder while a double is pending,
    /// otherwise the player whose turn it is.
    pub fn player_to_act(&self) -> Player {
        match self.cube.offer_pending_from() {
            Some(offerer) => offerer.opponent(),
            None => self.turn.player(),
        }
    }

    /// Moves that may be committed next.
    pub fn legal_moves(&self) -> Vec<Move> {
        if self.is_over() {
            Vec::new()
        } else {
            self.turn.legal_moves()
        }
    }

    /// Maximal sequences still available this turn.
    pub fn legal_sequences(&self) -> &MoveSequences {
        self.turn.legal()
    }

    /// Events queued since the last drain.
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Takes every queued event, oldest first.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // ─── Guards ───────────────────────────────────────────────

    fn out_of_turn(&self, operation: &'static str) -> GameError {
        warn!(operation, phase = ?self.turn.phase(), "Operation out of turn");
        GameError::OutOfTurn {
            operation,
            phase: self.turn.phase(),
        }
    }

    fn ensure_in_progress(&self, operation: &'static str) -> Result<(), GameError> {
        if self.is_over() {
            return Err(self.out_of_turn(operation));
        }
        Ok(())
    }

    fn ensure_can_roll(&self) -> Result<(), GameError> {
        self.ensure_in_progress("roll")?;
        if self.cube.offer_pending_from().is_some()
            || self.turn.phase() != TurnPhase::AwaitingRoll
        {
            return Err(self.out_of_turn("roll"));
        }
        Ok(())
    }

    // ─── Turn operations ──────────────────────────────────────

    /// Records a roll for the player on turn.
    ///
    /// If no die can be played the turn passes immediately.
    #[instrument(skip(self), fields(player = %self.turn.player()))]
    pub fn roll(&mut self, roll: Roll) -> Result<(), GameError> {
        self.ensure_can_roll()?;
        self.turn.apply_roll(&self.board, roll)?;
        let player = self.turn.player();
        let count = &mut self.rolls[player.index()];
        *count = count.saturating_add(1);
        self.events.push(GameEvent::DiceRolled { player, roll });
        if self.turn.phase() == TurnPhase::TurnComplete {
            self.finish_turn()?;
        }
        Ok(())
    }

    /// Rolls with `dice` and records the result.
    pub fn roll_with(&mut self, dice: &mut impl DiceRoller) -> Result<Roll, GameError> {
        self.ensure_can_roll()?;
        let roll = dice.roll();
        self.roll(roll)?;
        Ok(roll)
    }

    /// Plays one checker, returning the move as played.
    ///
    /// The move is matched against the maximal sequences by source and
    /// destination, so the hit flag and a bear-off die are reconciled here.
    #[instrument(skip(self), fields(player = %self.turn.player()))]
    pub fn commit_move(&mut self, requested: &Move) -> Result<Move, GameError> {
        self.ensure_in_progress("commit_move")?;

        let mut turn = self.turn.clone();
        let (board, played) = turn.commit_move(&self.board, requested)?;
        if cfg!(debug_assertions) {
            board.verify()?;
        }

        let player = turn.player();
        self.board = board;
        self.turn = turn;
        self.events.push(GameEvent::MoveApplied {
            player,
            mv: played,
            notation: notation::encode(&played),
        });

        if self.board.has_borne_off_all(player) {
            let level = GammonLevel::assess(&self.board, player);
            self.end_game(player, level, EndReason::BearOff);
        } else if self.turn.phase() == TurnPhase::TurnComplete {
            self.finish_turn()?;
        }
        Ok(played)
    }

    /// Decodes `token` for the player on turn and commits it.
    pub fn commit_notation(&mut self, token: &str) -> Result<Move, GameError> {
        self.ensure_in_progress("commit_move")?;
        let requested = notation::decode(token, self.turn.player())?;
        self.commit_move(&requested)
    }

    /// Commits several moves at once. Either all of them are played or none.
    #[instrument(skip(self, moves), fields(count = moves.len()))]
    pub fn commit_sequence(&mut self, moves: &[Move]) -> Result<Vec<Move>, GameError> {
        let mut trial = self.clone();
        let played = moves
            .iter()
            .map(|mv| trial.commit_move(mv))
            .collect::<Result<Vec<_>, _>>()?;
        *self = trial;
        Ok(played)
    }

    /// Ends the turn of `player` from outside, as a turn clock would.
    ///
    /// Moves already committed stay on the board. A responder who forfeits
    /// while a double is pending passes the double.
    #[instrument(skip(self))]
    pub fn forfeit_turn(&mut self, player: Player) -> Result<(), GameError> {
        self.ensure_in_progress("forfeit_turn")?;
        if player != self.player_to_act() {
            return Err(self.out_of_turn("forfeit_turn"));
        }

        if self.cube.offer_pending_from().is_some() {
            self.events.push(GameEvent::TurnForfeited { player });
            self.respond_to_double(false)?;
            return Ok(());
        }

        let mut turn = self.turn.clone();
        turn.forfeit()?;
        self.turn = turn;
        self.events.push(GameEvent::TurnForfeited { player });
        self.finish_turn()
    }

    fn finish_turn(&mut self) -> Result<(), GameError> {
        let next = self.turn.hand_off()?;
        let player = self.turn.player();
        debug!(%player, moves = self.turn.moves_applied().len(), "Turn complete");
        self.events.push(GameEvent::TurnEnded { player });
        self.events.push(GameEvent::TurnStarted {
            player: next.player(),
        });
        self.turn = next;
        Ok(())
    }

    // ─── Cube operations ──────────────────────────────────────

    fn offer_context(&self) -> OfferContext {
        OfferContext {
            crawford_game: self.crawford_game,
            post_crawford: self.standing.post_crawford,
            match_length: *self.rules.match_length(),
            scores: self.standing.scores,
            rolls: self.rolls,
            dead_cube: *self.rules.dead_cube(),
            holland: *self.rules.holland(),
        }
    }

    /// Checks whether the cube gates let `player` double now.
    pub fn can_offer_double(&self, player: Player) -> Result<(), DoubleRefusal> {
        self.cube.can_offer(player, &self.offer_context())
    }

    /// Offers a double. Only the player on turn may double, before rolling.
    #[instrument(skip(self))]
    pub fn offer_double(&mut self, player: Player) -> Result<(), GameError> {
        self.ensure_in_progress("offer_double")?;
        if player != self.turn.player() || self.turn.phase() != TurnPhase::AwaitingRoll {
            return Err(self.out_of_turn("offer_double"));
        }
        let context = self.offer_context();
        self.cube.offer(player, &context)?;
        self.events.push(GameEvent::CubeOffered {
            player,
            value: self.cube.value().saturating_mul(2),
        });
        Ok(())
    }

    /// Answers the pending double.
    ///
    /// A take hands the cube to the responder and the offerer goes on to
    /// roll. A pass ends the game for the offerer at the pre-offer value.
    #[instrument(skip(self))]
    pub fn respond_to_double(&mut self, accept: bool) -> Result<CubeResolution, GameError> {
        self.ensure_in_progress("respond_to_double")?;
        let resolution = self.cube.respond(accept)?;
        self.events.push(GameEvent::CubeResolved(resolution));

        if let CubeResolution::Declined { winner, points } = resolution {
            self.finish(GameOutcome {
                winner,
                gammon_level: GammonLevel::Single,
                points_awarded: points,
                cube_value: self.cube.value(),
                reason: EndReason::DoubleDeclined,
            });
        }
        Ok(resolution)
    }

    /// Concedes the game at the chosen level.
    #[instrument(skip(self))]
    pub fn resign(
        &mut self,
        player: Player,
        kind: ResignationKind,
    ) -> Result<GameOutcome, GameError> {
        self.ensure_in_progress("resign")?;
        if self.cube.offer_pending_from().is_some() {
            warn!("Resignation refused while a double is pending");
            return Err(GameError::DoubleNotAllowed(DoubleRefusal::OfferPending));
        }
        let outcome = self.end_game(player.opponent(), kind.level(), EndReason::Resignation(kind));
        Ok(outcome)
    }

    // ─── Game end ─────────────────────────────────────────────

    fn end_game(&mut self, winner: Player, level: GammonLevel, reason: EndReason) -> GameOutcome {
        let outcome = GameOutcome {
            winner,
            gammon_level: effective_level(level, &self.cube, &self.rules),
            points_awarded: points_awarded(level, &self.cube, &self.rules),
            cube_value: self.cube.value(),
            reason,
        };
        self.finish(outcome);
        outcome
    }

    fn finish(&mut self, outcome: GameOutcome) {
        info!(
            winner = %outcome.winner,
            level = %outcome.gammon_level,
            points = outcome.points_awarded,
            reason = ?outcome.reason,
            "Game over"
        );
        self.events.push(GameEvent::GameEnded {
            winner: outcome.winner,
            gammon_level: outcome.gammon_level,
            points_awarded: outcome.points_awarded,
            reason: outcome.reason,
        });
        self.outcome = Some(outcome);
    }

    // ─── Persistence ──────────────────────────────────────────

    /// Captures the game for storage. Queued events are not included.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            board: self.board,
            turn: self.turn.clone(),
            cube: self.cube,
            rules: self.rules,
            crawford_game: self.crawford_game,
            standing: self.standing,
            rolls: self.rolls,
            outcome: self.outcome,
        }
    }

    /// Rebuilds a game from a snapshot, rejecting inconsistent state.
    #[instrument(skip(snapshot))]
    pub fn restore(snapshot: GameSnapshot) -> Result<Self, GameError> {
        let GameSnapshot {
            board,
            mut turn,
            cube,
            rules,
            crawford_game,
            standing,
            rolls,
            outcome,
        } = snapshot;

        board.verify()?;
        CubeInvariants::check_all(&cube).map_err(|violations| {
            let descriptions = violations
                .iter()
                .map(|v| v.description.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            warn!(%descriptions, "Cube invariant violated");
            GameError::InvariantViolation(descriptions)
        })?;
        rules
            .validate()
            .map_err(|err| GameError::InvariantViolation(err.message))?;
        turn.rehydrate(&board)?;

        let consistent = match (outcome, turn.phase()) {
            (None, TurnPhase::TurnComplete) => false,
            (None, _) => cube.offer_pending_from().is_none_or(|offerer| {
                offerer == turn.player() && turn.phase() == TurnPhase::AwaitingRoll
            }),
            (Some(_), _) => cube.offer_pending_from().is_none(),
        };
        if !consistent {
            warn!(phase = ?turn.phase(), "Turn and cube disagree");
            return Err(GameError::InvariantViolation(
                "turn phase and cube state are inconsistent".to_string(),
            ));
        }
        if crawford_game && !cube.is_unturned() {
            return Err(GameError::InvariantViolation(
                "cube turned during the Crawford game".to_string(),
            ));
        }

        debug!(player = %turn.player(), phase = ?turn.phase(), "Game restored");
        Ok(Self {
            board,
            turn,
            cube,
            rules,
            crawford_game,
            standing,
            rolls,
            outcome,
            events: Vec::new(),
        })
    }
}
