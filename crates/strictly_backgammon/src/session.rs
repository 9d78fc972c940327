//! Match sessions: a sequence of games scored into one match.

use crate::config::{ConfigError, MatchRules};
use crate::cube::CubeResolution;
use crate::dice::{DiceRoller, Roll};
use crate::error::GameError;
use crate::events::GameEvent;
use crate::game::Game;
use crate::match_state::MatchState;
use crate::scoring::{GameOutcome, ResignationKind};
use crate::snapshot::SessionSnapshot;
use crate::types::{Move, Player};
use tracing::{debug, error, info, instrument, warn};

/// A match (or money session) and the game currently being played.
///
/// Game results flow into the score exactly once, and the Crawford flag of
/// the score decides whether each new game allows doubling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSession {
    state: MatchState,
    game: Game,
    recorded: bool,
    events: Vec<GameEvent>,
}

impl MatchSession {
    /// Starts a match with `first` to roll in the opening game.
    #[instrument]
    pub fn new(rules: MatchRules, first: Player) -> Result<Self, ConfigError> {
        rules.validate()?;
        info!(match_length = ?rules.match_length(), "Creating match session");
        let state = MatchState::new(rules);
        let mut session = Self {
            game: Game::new(rules, state.crawford_game_active(), first)
                .with_standing(state.standing()),
            state,
            recorded: false,
            events: Vec::new(),
        };
        session.absorb();
        Ok(session)
    }

    /// Score and Crawford flags.
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Game being played (or just finished).
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Winner of the match, once decided.
    pub fn winner(&self) -> Option<Player> {
        self.state.winner()
    }

    /// True once the match is decided.
    pub fn is_match_over(&self) -> bool {
        self.state.is_over()
    }

    /// Takes every queued event, oldest first.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Moves game events into the session queue and scores a finished game once.
    fn absorb(&mut self) {
        self.events.append(&mut self.game.drain_events());
        if self.recorded {
            return;
        }
        let Some(outcome) = self.game.outcome().copied() else {
            return;
        };
        self.recorded = true;
        match self.state.record_game(&outcome) {
            Ok(Some(winner)) => self.events.push(GameEvent::MatchEnded { winner }),
            Ok(None) => debug!(
                white = self.state.score(Player::White),
                black = self.state.score(Player::Black),
                "Score updated"
            ),
            Err(err) => error!(%err, "Game result not recorded"),
        }
    }

    fn forward<T>(
        &mut self,
        op: impl FnOnce(&mut Game) -> Result<T, GameError>,
    ) -> Result<T, GameError> {
        let result = op(&mut self.game);
        self.absorb();
        result
    }

    /// See [`Game::roll`].
    pub fn roll(&mut self, roll: Roll) -> Result<(), GameError> {
        self.forward(|game| game.roll(roll))
    }

    /// See [`Game::roll_with`].
    pub fn roll_with(&mut self, dice: &mut impl DiceRoller) -> Result<Roll, GameError> {
        self.forward(|game| game.roll_with(dice))
    }

    /// See [`Game::commit_move`].
    pub fn commit_move(&mut self, mv: &Move) -> Result<Move, GameError> {
        self.forward(|game| game.commit_move(mv))
    }

    /// See [`Game::commit_notation`].
    pub fn commit_notation(&mut self, token: &str) -> Result<Move, GameError> {
        self.forward(|game| game.commit_notation(token))
    }

    /// See [`Game::commit_sequence`].
    pub fn commit_sequence(&mut self, moves: &[Move]) -> Result<Vec<Move>, GameError> {
        self.forward(|game| game.commit_sequence(moves))
    }

    /// See [`Game::offer_double`].
    pub fn offer_double(&mut self, player: Player) -> Result<(), GameError> {
        self.forward(|game| game.offer_double(player))
    }

    /// See [`Game::respond_to_double`].
    pub fn respond_to_double(&mut self, accept: bool) -> Result<CubeResolution, GameError> {
        self.forward(|game| game.respond_to_double(accept))
    }

    /// See [`Game::resign`].
    pub fn resign(
        &mut self,
        player: Player,
        kind: ResignationKind,
    ) -> Result<GameOutcome, GameError> {
        self.forward(|game| game.resign(player, kind))
    }

    /// See [`Game::forfeit_turn`].
    pub fn forfeit_turn(&mut self, player: Player) -> Result<(), GameError> {
        self.forward(|game| game.forfeit_turn(player))
    }

    /// Replaces a finished game with a fresh one.
    ///
    /// The new game is the Crawford game if the score says so.
    #[instrument(skip(self))]
    pub fn start_next_game(&mut self, first: Player) -> Result<(), GameError> {
        if !self.game.is_over() || self.state.is_over() {
            warn!(
                game_over = self.game.is_over(),
                match_over = self.state.is_over(),
                "Cannot start another game"
            );
            return Err(GameError::OutOfTurn {
                operation: "start_next_game",
                phase: self.game.turn().phase(),
            });
        }
        let crawford = self.state.crawford_game_active();
        debug!(%first, crawford, game = self.state.games_played() + 1, "Starting next game");
        self.game =
            Game::new(*self.state.rules(), crawford, first).with_standing(self.state.standing());
        self.recorded = false;
        self.absorb();
        Ok(())
    }

    /// Captures the session for storage. Queued events are not included.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state.clone(),
            game: self.game.snapshot(),
            recorded: self.recorded,
        }
    }

    /// Rebuilds a session, rejecting a snapshot whose parts disagree.
    #[instrument(skip(snapshot))]
    pub fn restore(snapshot: SessionSnapshot) -> Result<Self, GameError> {
        let SessionSnapshot {
            state,
            game,
            recorded,
        } = snapshot;
        state.verify()?;
        let game = Game::restore(game)?;

        if game.rules() != state.rules() {
            return Err(GameError::InvariantViolation(
                "game rules differ from match rules".to_string(),
            ));
        }
        if recorded && !game.is_over() {
            return Err(GameError::InvariantViolation(
                "unfinished game marked as recorded".to_string(),
            ));
        }
        if !game.is_over() && game.is_crawford_game() != state.crawford_game_active() {
            return Err(GameError::InvariantViolation(
                "Crawford flag differs between game and match".to_string(),
            ));
        }
        if !recorded && game.standing() != state.standing() {
            return Err(GameError::InvariantViolation(
                "game standing differs from the match score".to_string(),
            ));
        }
        if !recorded && game.is_over() && state.is_over() {
            warn!("Unrecorded game result after the match ended");
            return Err(GameError::InvariantViolation(
                "finished game cannot be scored: the match is already over".to_string(),
            ));
        }

        let mut session = Self {
            state,
            game,
            recorded,
            events: Vec::new(),
        };
        session.absorb();
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turn::TurnPhase;

    #[test]
    fn test_zero_length_match_rejected() {
        let rules: MatchRules = toml::from_str("match_length = 0").unwrap();
        assert!(MatchSession::new(rules, Player::White).is_err());
    }

    #[test]
    fn test_declined_double_scores_once() {
        let mut session = MatchSession::new(MatchRules::match_to(3), Player::White).unwrap();
        session.offer_double(Player::White).unwrap();
        session.respond_to_double(false).unwrap();
        assert_eq!(session.state().score(Player::White), 1);

        // Failing operations on the finished game do not score it again.
        assert!(session.roll(Roll::new(1, 2).unwrap()).is_err());
        assert_eq!(session.state().score(Player::White), 1);
        assert_eq!(session.state().games_played(), 1);
    }

    #[test]
    fn test_next_game_requires_finished_game() {
        let mut session = MatchSession::new(MatchRules::money(false), Player::White).unwrap();
        assert!(matches!(
            session.start_next_game(Player::Black),
            Err(GameError::OutOfTurn {
                operation: "start_next_game",
                phase: TurnPhase::AwaitingRoll
            })
        ));
        session.resign(Player::White, ResignationKind::Single).unwrap();
        session.start_next_game(Player::Black).unwrap();
        assert_eq!(session.game().turn().player(), Player::Black);
        assert!(!session.game().is_over());
    }

    #[test]
    fn test_match_end_emits_event() {
        let mut session = MatchSession::new(MatchRules::match_to(1), Player::White).unwrap();
        session.resign(Player::Black, ResignationKind::Single).unwrap();
        assert_eq!(session.winner(), Some(Player::White));
        let events = session.drain_events();
        assert_eq!(events.last(), Some(&GameEvent::MatchEnded { winner: Player::White }));
        assert!(session.start_next_game(Player::White).is_err());
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let mut session = MatchSession::new(MatchRules::match_to(5), Player::White).unwrap();
        session.offer_double(Player::White).unwrap();
        session.drain_events();

        let json = session.snapshot().to_json().unwrap();
        let restored = MatchSession::restore(SessionSnapshot::from_json(&json).unwrap()).unwrap();
        assert_eq!(restored, session);
    }

    #[test]
    fn test_next_game_carries_standing() {
        let mut session = MatchSession::new(MatchRules::match_to(5), Player::White).unwrap();
        session.resign(Player::Black, ResignationKind::Gammon).unwrap();
        session.start_next_game(Player::Black).unwrap();
        assert_eq!(session.game().standing(), session.state().standing());
        assert_eq!(session.game().standing().scores, [2, 0]);
    }

    #[test]
    fn test_restore_rejects_unscored_game_after_match_end() {
        let mut session = MatchSession::new(MatchRules::match_to(1), Player::White).unwrap();
        session.resign(Player::Black, ResignationKind::Single).unwrap();
        assert!(session.is_match_over());

        // A second finished game that never reached the score.
        let mut extra = Game::new(MatchRules::match_to(1), false, Player::Black)
            .with_standing(session.state().standing());
        extra.resign(Player::White, ResignationKind::Single).unwrap();
        let snapshot = SessionSnapshot {
            state: session.state().clone(),
            game: extra.snapshot(),
            recorded: false,
        };
        assert!(matches!(
            MatchSession::restore(snapshot),
            Err(GameError::InvariantViolation(_))
        ));

        // The consistent snapshot still restores.
        assert!(MatchSession::restore(session.snapshot()).is_ok());
    }
}
