//! Scenario loading and configuration.
//!
//! A scenario is a match config plus, for each player, a scripted list of
//! raw outputs to replay one per round. Players without a script (or past
//! the end of it) answer `WAIT`.

use std::path::Path;

use outpost_core::config::{MatchConfig, PLAYER_COUNT};
use outpost_core::entities::PlayerId;
use outpost_core::error::GameError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Failed to write RON.
    #[error("Failed to serialize scenario: {0}")]
    SerializeError(#[from] ron::Error),
    /// The match config is not playable.
    #[error("Invalid scenario config: {0}")]
    InvalidConfig(#[from] GameError),
    /// More scripts than seats.
    #[error("Scenario scripts {count} players, the match seats {PLAYER_COUNT}")]
    TooManyPlayers {
        /// Number of scripts in the file.
        count: usize,
    },
}

/// Scripted outputs for one player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerScript {
    /// Raw output for each round, in order.
    #[serde(default)]
    pub turns: Vec<String>,
    /// Zero-based turn at which the player stops answering.
    #[serde(default)]
    pub time_out_at: Option<u32>,
}

impl PlayerScript {
    /// Script from a list of turns.
    pub fn new<I, S>(turns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            turns: turns.into_iter().map(Into::into).collect(),
            time_out_at: None,
        }
    }

    /// Stop answering at `turn`.
    #[must_use]
    pub const fn timing_out_at(mut self, turn: u32) -> Self {
        self.time_out_at = Some(turn);
        self
    }
}

/// A complete scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Map seed, hints and rules.
    pub config: MatchConfig,
    /// One script per player, in player order.
    #[serde(default)]
    pub players: Vec<PlayerScript>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::skirmish(0)
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Write the scenario as pretty RON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ScenarioError> {
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Unscripted match on a generated map with full rules.
    #[must_use]
    pub fn skirmish(seed: u64) -> Self {
        Self {
            name: format!("Skirmish (seed: {seed})"),
            description: "Generated map, both players idle".to_string(),
            config: MatchConfig::new(seed),
            players: Vec::new(),
        }
    }

    /// Same scenario on another seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Check the config and the number of scripts.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.players.len() > PLAYER_COUNT {
            return Err(ScenarioError::TooManyPlayers {
                count: self.players.len(),
            });
        }
        self.config.validate()?;
        Ok(())
    }

    /// Script for `player`; empty if the scenario has none.
    #[must_use]
    pub fn script(&self, player: PlayerId) -> PlayerScript {
        self.players
            .get(player.index())
            .cloned()
            .unwrap_or_default()
    }
}
