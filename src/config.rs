use std::collections::BTreeMap;
use std::env;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::common::EngineError;

pub const BOARD_SIZE: u8 = 10;

/// Ship lengths the engine recognizes.
pub const MIN_SHIP_LEN: u8 = 2;
pub const MAX_SHIP_LEN: u8 = 5;

/// Defaults for the currency collaborator.
pub const DEFAULT_WIN_REWARD: u64 = 100;
pub const DEFAULT_LOSS_PENALTY: u64 = 50;

/// Required number of ships per length. Never empty, and always fits on
/// the grid cell-wise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<u8, u8>", into = "BTreeMap<u8, u8>")]
pub struct FleetRequirement {
    counts: BTreeMap<u8, u8>,
}

impl FleetRequirement {
    /// Build a requirement from `(length, count)` pairs. Lengths outside
    /// `MIN_SHIP_LEN..=MAX_SHIP_LEN` are rejected; zero counts are dropped.
    /// A fleet with no ships, or more ship cells than the grid holds, is
    /// `InvalidFleet`.
    pub fn new<I>(counts: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = (u8, u8)>,
    {
        let mut map: BTreeMap<u8, u8> = BTreeMap::new();
        for (len, count) in counts {
            if !(MIN_SHIP_LEN..=MAX_SHIP_LEN).contains(&len) {
                return Err(EngineError::InvalidShipLength(len));
            }
            if count > 0 {
                let slot = map.entry(len).or_insert(0);
                *slot = slot.checked_add(count).ok_or(EngineError::InvalidFleet)?;
            }
        }
        let requirement = Self { counts: map };
        let grid = BOARD_SIZE as usize * BOARD_SIZE as usize;
        if requirement.counts.is_empty() || requirement.total_cells() > grid {
            return Err(EngineError::InvalidFleet);
        }
        Ok(requirement)
    }

    /// How many ships of `len` must be placed (0 if the length is not part of the fleet).
    pub fn required(&self, len: u8) -> u8 {
        self.counts.get(&len).copied().unwrap_or(0)
    }

    pub fn is_recognized(&self, len: u8) -> bool {
        self.required(len) > 0
    }

    /// `(length, count)` pairs in ascending length order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.counts.iter().map(|(&len, &count)| (len, count))
    }

    /// Every ship length, repeated by its count, longest first.
    pub fn ship_lengths(&self) -> Vec<u8> {
        self.counts
            .iter()
            .rev()
            .flat_map(|(&len, &count)| core::iter::repeat(len).take(count as usize))
            .collect()
    }

    pub fn total_cells(&self) -> usize {
        self.iter().map(|(len, count)| len as usize * count as usize).sum()
    }
}

impl TryFrom<BTreeMap<u8, u8>> for FleetRequirement {
    type Error = EngineError;

    fn try_from(counts: BTreeMap<u8, u8>) -> Result<Self, Self::Error> {
        Self::new(counts)
    }
}

impl From<FleetRequirement> for BTreeMap<u8, u8> {
    fn from(requirement: FleetRequirement) -> Self {
        requirement.counts
    }
}

impl Default for FleetRequirement {
    /// One destroyer, two cruisers, one battleship, one carrier.
    fn default() -> Self {
        let counts = BTreeMap::from([(2, 1), (3, 2), (4, 1), (5, 1)]);
        Self { counts }
    }
}

/// How the turn moves after a shot that does not end the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum TurnPolicy {
    /// A miss passes the turn; a hit lets the shooter fire again.
    #[default]
    HitKeepsTurn,
    /// The turn passes after every shot.
    Alternate,
}

impl core::str::FromStr for TurnPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hit-keeps-turn" | "hit_keeps_turn" => Ok(TurnPolicy::HitKeepsTurn),
            "alternate" => Ok(TurnPolicy::Alternate),
            other => Err(anyhow::anyhow!("unknown turn policy '{}'", other)),
        }
    }
}

/// Engine-wide settings, fixed at registry construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub fleet: FleetRequirement,
    pub turn_policy: TurnPolicy,
    /// Credited to the winner on game over.
    pub win_reward: u64,
    /// Debited from the loser on game over.
    pub loss_penalty: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fleet: FleetRequirement::default(),
            turn_policy: TurnPolicy::default(),
            win_reward: DEFAULT_WIN_REWARD,
            loss_penalty: DEFAULT_LOSS_PENALTY,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `BATTLESHIP_WIN_REWARD`, `BATTLESHIP_LOSS_PENALTY`
    /// and `BATTLESHIP_TURN_POLICY` when set.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = env::var("BATTLESHIP_WIN_REWARD") {
            config.win_reward = raw
                .parse()
                .with_context(|| format!("BATTLESHIP_WIN_REWARD is not a number: {}", raw))?;
        }
        if let Ok(raw) = env::var("BATTLESHIP_LOSS_PENALTY") {
            config.loss_penalty = raw
                .parse()
                .with_context(|| format!("BATTLESHIP_LOSS_PENALTY is not a number: {}", raw))?;
        }
        if let Ok(raw) = env::var("BATTLESHIP_TURN_POLICY") {
            config.turn_policy = raw.parse()?;
        }
        Ok(config)
    }
}
