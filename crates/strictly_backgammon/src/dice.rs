//! Dice: validated rolls, the multiset of unused die values, and roll sources.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::instrument;

/// A roll of two six-sided dice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Roll {
    first: u8,
    second: u8,
}

impl Roll {
    /// Creates a roll, or `None` if either value is outside 1-6.
    pub fn new(first: u8, second: u8) -> Option<Self> {
        let valid = |d: u8| (1..=6).contains(&d);
        (valid(first) && valid(second)).then_some(Self { first, second })
    }

    /// The two dice as rolled.
    pub fn dice(&self) -> [u8; 2] {
        [self.first, self.second]
    }

    /// True if both dice show the same value.
    pub fn is_double(&self) -> bool {
        self.first == self.second
    }
}

impl std::fmt::Display for Roll {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.first, self.second)
    }
}

/// Multiset of unused die values (1-4 entries after a roll).
///
/// Values are kept sorted from highest to lowest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct DieSet {
    values: Vec<u8>,
}

impl DieSet {
    /// Expands a roll: doubles give four copies, otherwise the two values.
    pub fn from_roll(roll: Roll) -> Self {
        let values = if roll.is_double() {
            vec![roll.first; 4]
        } else {
            vec![roll.first, roll.second]
        };
        Self::from_values(values)
    }

    /// Builds a set from raw values.
    pub fn from_values(mut values: Vec<u8>) -> Self {
        values.sort_unstable_by(|a, b| b.cmp(a));
        Self { values }
    }

    /// Remaining values, highest first.
    pub fn values(&self) -> &[u8] {
        &self.values
    }

    /// Number of unused dice.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when every die has been used.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True if `die` is still unused.
    pub fn contains(&self, die: u8) -> bool {
        self.values.contains(&die)
    }

    /// Distinct unused values, highest first.
    pub fn distinct(&self) -> Vec<u8> {
        let mut values = self.values.clone();
        values.dedup();
        values
    }

    /// Copy of this set with one `die` removed, or `None` if it is not present.
    pub fn without(&self, die: u8) -> Option<Self> {
        let position = self.values.iter().position(|&d| d == die)?;
        let mut values = self.values.clone();
        values.remove(position);
        Some(Self { values })
    }
}

/// Source of dice rolls.
pub trait DiceRoller {
    /// Produces the next roll.
    fn roll(&mut self) -> Roll;
}

/// Uniformly random dice backed by a seedable generator.
#[derive(Debug, Clone)]
pub struct RandomDice {
    rng: StdRng,
}

impl RandomDice {
    /// Dice seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Reproducible dice for replays and tests.
    #[instrument]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomDice {
    fn default() -> Self {
        Self::new()
    }
}

impl DiceRoller for RandomDice {
    fn roll(&mut self) -> Roll {
        let first = self.rng.random_range(1..=6);
        let second = self.rng.random_range(1..=6);
        Roll { first, second }
    }
}

/// Scripted dice that replay a fixed list of rolls, wrapping around at the end.
#[derive(Debug, Clone)]
pub struct FixedDice {
    script: VecDeque<Roll>,
}

impl FixedDice {
    /// Creates scripted dice. An empty script rolls 1-2 forever.
    pub fn new(script: impl IntoIterator<Item = Roll>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }
}

impl DiceRoller for FixedDice {
    fn roll(&mut self) -> Roll {
        match self.script.pop_front() {
            Some(roll) => {
                self.script.push_back(roll);
                roll
            }
            None => Roll { first: 1, second: 2 },
        }
    }
}
