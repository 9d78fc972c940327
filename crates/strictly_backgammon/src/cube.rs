//! Doubling cube protocol: offer, accept, decline and ownership.

use crate::error::DoubleRefusal;
use crate::types::Player;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Who may turn the cube next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum CubeOwner {
    /// Either player may double.
    Centered,
    /// Only this player may redouble.
    Owned(Player),
}

/// Observable protocol state of the cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum CubeState {
    /// Nobody has doubled yet.
    Centered,
    /// The player accepted a double and holds the cube.
    Owned(Player),
    /// A double from this player awaits an answer.
    OfferPending(Player),
}

/// Result of answering a double.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum CubeResolution {
    /// The cube doubled and passed to the taker.
    Accepted {
        /// New cube value.
        value: u32,
        /// Player now owning the cube.
        owner: Player,
    },
    /// The game is lost by the player who passed.
    Declined {
        /// The player who offered.
        winner: Player,
        /// Points at stake before the offer.
        points: u32,
    },
}

/// Match situation a double is judged against, beyond the cube itself.
///
/// The default describes money play: no Crawford game and no optional gates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OfferContext {
    /// This game is the Crawford game.
    pub crawford_game: bool,
    /// The Crawford game has already been played.
    pub post_crawford: bool,
    /// Points needed to win the match; `None` in money play.
    pub match_length: Option<u32>,
    /// Scores before this game, indexed by [`Player::index`].
    pub scores: [u32; 2],
    /// Rolls each player has made this game, indexed by [`Player::index`].
    pub rolls: [u32; 2],
    /// Enforce the dead-cube gate.
    pub dead_cube: bool,
    /// Enforce the Holland gate.
    pub holland: bool,
}

impl OfferContext {
    fn is_trailing(&self, player: Player) -> bool {
        self.scores[player.index()] < self.scores[player.opponent().index()]
    }
}

/// The doubling cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Cube {
    value: u32,
    owner: CubeOwner,
    offer_pending_from: Option<Player>,
}

impl Cube {
    /// A centered cube showing 1.
    pub fn new() -> Self {
        Self {
            value: 1,
            owner: CubeOwner::Centered,
            offer_pending_from: None,
        }
    }

    /// Current value.
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Current owner.
    pub fn owner(&self) -> CubeOwner {
        self.owner
    }

    /// Player whose double awaits an answer.
    pub fn offer_pending_from(&self) -> Option<Player> {
        self.offer_pending_from
    }

    /// Protocol state.
    pub fn state(&self) -> CubeState {
        match (self.offer_pending_from, self.owner) {
            (Some(player), _) => CubeState::OfferPending(player),
            (None, CubeOwner::Owned(player)) => CubeState::Owned(player),
            (None, CubeOwner::Centered) => CubeState::Centered,
        }
    }

    /// True while the cube has never been turned this game.
    pub fn is_unturned(&self) -> bool {
        self.value == 1 && self.owner == CubeOwner::Centered
    }

    /// Checks whether `player` may double now.
    pub fn can_offer(&self, player: Player, context: &OfferContext) -> Result<(), DoubleRefusal> {
        if self.offer_pending_from.is_some() {
            return Err(DoubleRefusal::OfferPending);
        }
        if context.crawford_game {
            return Err(DoubleRefusal::CrawfordGame);
        }
        if matches!(self.owner, CubeOwner::Owned(owner) if owner != player) {
            return Err(DoubleRefusal::OpponentOwnsCube);
        }
        if context.holland
            && context.post_crawford
            && context.is_trailing(player)
            && context.rolls[player.index()] < 2
        {
            return Err(DoubleRefusal::HollandRule);
        }
        let score = context.scores[player.index()];
        if context.dead_cube
            && context
                .match_length
                .is_some_and(|length| score.saturating_add(self.value) >= length)
        {
            return Err(DoubleRefusal::DeadCube);
        }
        if self.value.checked_mul(2).is_none() {
            return Err(DoubleRefusal::CubeAtMaximum);
        }
        Ok(())
    }

    /// Offers a double on behalf of `player`.
    #[instrument(skip(self, context))]
    pub fn offer(&mut self, player: Player, context: &OfferContext) -> Result<(), DoubleRefusal> {
        self.can_offer(player, context).inspect_err(|refusal| {
            warn!(%refusal, "Double refused");
        })?;
        self.offer_pending_from = Some(player);
        debug!(value = self.value, "Double offered");
        Ok(())
    }

    /// Answers the pending double.
    ///
    /// Accepting doubles the value and hands the cube to the taker. Declining
    /// awards the offerer the value as it stood before the offer.
    #[instrument(skip(self))]
    pub fn respond(&mut self, accept: bool) -> Result<CubeResolution, DoubleRefusal> {
        let offerer = self.offer_pending_from.ok_or(DoubleRefusal::NoOfferPending)?;
        self.offer_pending_from = None;

        if accept {
            self.value *= 2;
            self.owner = CubeOwner::Owned(offerer.opponent());
            debug!(value = self.value, "Double accepted");
            Ok(CubeResolution::Accepted {
                value: self.value,
                owner: offerer.opponent(),
            })
        } else {
            debug!(value = self.value, "Double declined");
            Ok(CubeResolution::Declined {
                winner: offerer,
                points: self.value,
            })
        }
    }
}

impl Default for Cube {
    fn default() -> Self {
        Self::new()
    }
}
