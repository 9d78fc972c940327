//! Match score and Crawford tracking across games.

use crate::config::MatchRules;
use crate::error::GameError;
use crate::scoring::GameOutcome;
use crate::types::Player;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// Score as it stood when a game began, as the cube gates see it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct MatchStanding {
    /// Scores indexed by [`Player::index`].
    pub scores: [u32; 2],
    /// The Crawford game has already been played.
    pub post_crawford: bool,
}

/// Running state of a match or money session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MatchState {
    scores: [u32; 2],
    rules: MatchRules,
    crawford_game_active: bool,
    crawford_used: bool,
    games_played: u32,
    winner: Option<Player>,
}

impl MatchState {
    /// A fresh match at 0-0.
    pub fn new(rules: MatchRules) -> Self {
        Self {
            scores: [0, 0],
            rules,
            crawford_game_active: false,
            crawford_used: false,
            games_played: 0,
            winner: None,
        }
    }

    /// Score of `player`.
    pub fn score(&self, player: Player) -> u32 {
        self.scores[player.index()]
    }

    /// Rules in force.
    pub fn rules(&self) -> &MatchRules {
        &self.rules
    }

    /// True if the next (or current) game is the Crawford game.
    pub fn crawford_game_active(&self) -> bool {
        self.crawford_game_active
    }

    /// True once the Crawford game has been played.
    pub fn crawford_used(&self) -> bool {
        self.crawford_used
    }

    /// Scores and Crawford history for the next game.
    pub fn standing(&self) -> MatchStanding {
        MatchStanding {
            scores: self.scores,
            post_crawford: self.crawford_used,
        }
    }

    /// Games recorded so far.
    pub fn games_played(&self) -> u32 {
        self.games_played
    }

    /// Winner of the match, once decided.
    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    /// True once a player has reached the match length. Money play never ends.
    pub fn is_over(&self) -> bool {
        self.winner.is_some()
    }

    /// Adds a finished game to the score and advances the Crawford flags.
    ///
    /// Returns the match winner if this game decided the match.
    #[instrument(
        skip(self, outcome),
        fields(winner = %outcome.winner, points = outcome.points_awarded)
    )]
    pub fn record_game(&mut self, outcome: &GameOutcome) -> Result<Option<Player>, GameError> {
        if let Some(winner) = self.winner {
            warn!(%winner, "Game recorded after the match ended");
            return Err(GameError::InvariantViolation(format!(
                "match already won by {winner}"
            )));
        }

        let winner = outcome.winner;
        let slot = &mut self.scores[winner.index()];
        *slot = slot.saturating_add(outcome.points_awarded);
        let score = *slot;
        self.games_played += 1;

        let was_crawford = self.crawford_game_active;
        if was_crawford {
            self.crawford_game_active = false;
            self.crawford_used = true;
        }

        let Some(length) = self.rules.match_length() else {
            return Ok(None);
        };

        if score >= *length {
            self.winner = Some(winner);
            info!(%winner, white = self.scores[0], black = self.scores[1], "Match won");
            return Ok(Some(winner));
        }

        if *self.rules.crawford() && !self.crawford_used && !was_crawford && score + 1 == *length {
            info!(%winner, "Next game is the Crawford game");
            self.crawford_game_active = true;
        }
        Ok(None)
    }

    /// Checks the score and flags are mutually consistent.
    pub fn verify(&self) -> Result<(), GameError> {
        let fail = |what: String| {
            warn!(%what, "Corrupt match state");
            Err(GameError::InvariantViolation(format!("match state: {what}")))
        };
        if self.crawford_game_active && self.crawford_used {
            return fail("Crawford game active after it was used".to_string());
        }
        if let Err(err) = self.rules.validate() {
            return fail(err.message);
        }
        let leader = match self.rules.match_length() {
            Some(length) => [Player::White, Player::Black]
                .into_iter()
                .find(|&p| self.score(p) >= *length),
            None => None,
        };
        if leader != self.winner {
            return fail("winner does not match the score".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{EndReason, GammonLevel};

    fn win(winner: Player, points: u32) -> GameOutcome {
        GameOutcome {
            winner,
            gammon_level: GammonLevel::Single,
            points_awarded: points,
            cube_value: points,
            reason: EndReason::BearOff,
        }
    }

    #[test]
    fn test_crawford_game_follows_match_point() {
        let mut state = MatchState::new(MatchRules::match_to(5));
        state.record_game(&win(Player::White, 2)).unwrap();
        assert!(!state.crawford_game_active());
        state.record_game(&win(Player::White, 2)).unwrap();
        assert_eq!(state.score(Player::White), 4);
        assert!(state.crawford_game_active());

        assert!(!state.standing().post_crawford);

        state.record_game(&win(Player::Black, 1)).unwrap();
        assert!(!state.crawford_game_active());
        assert!(state.crawford_used());
        assert_eq!(
            state.standing(),
            MatchStanding {
                scores: [4, 1],
                post_crawford: true
            }
        );

        // Black reaching match point later does not bring it back.
        state.record_game(&win(Player::Black, 3)).unwrap();
        assert_eq!(state.score(Player::Black), 4);
        assert!(!state.crawford_game_active());
        assert!(state.crawford_used());
    }

    #[test]
    fn test_match_ends_at_length() {
        let mut state = MatchState::new(MatchRules::match_to(3));
        assert_eq!(state.record_game(&win(Player::Black, 4)).unwrap(), Some(Player::Black));
        assert!(state.is_over());
        assert!(state.record_game(&win(Player::White, 1)).is_err());
        assert!(state.verify().is_ok());
    }

    #[test]
    fn test_crawford_disabled() {
        let mut state = MatchState::new(MatchRules::match_to(3).with_crawford(false));
        state.record_game(&win(Player::White, 2)).unwrap();
        assert!(!state.crawford_game_active());
    }

    #[test]
    fn test_money_play_never_ends() {
        let mut state = MatchState::new(MatchRules::money(false));
        for _ in 0..10 {
            assert_eq!(state.record_game(&win(Player::White, 64)).unwrap(), None);
        }
        assert_eq!(state.score(Player::White), 640);
        assert!(!state.is_over());
        assert!(!state.crawford_game_active());
    }

    #[test]
    fn test_verify_rejects_inconsistent_winner() {
        let mut state = MatchState::new(MatchRules::match_to(3));
        state.scores = [5, 0];
        assert!(state.verify().is_err());
    }
}
