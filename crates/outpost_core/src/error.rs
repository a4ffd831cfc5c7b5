//! Error types for the match simulation.

use thiserror::Error;

use crate::entities::{EntityId, PlayerId};

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for configuration, generation and engine failures.
///
/// Player mistakes are not represented here; those are [`OrderError`]s and
/// only ever affect the offending player.
#[derive(Debug, Error)]
pub enum GameError {
    /// A configuration value is outside the range the ruleset allows.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to parse a RON configuration document.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),

    /// Failed to read a configuration file.
    #[error("Failed to read configuration file '{path}': {source}")]
    ConfigRead {
        /// Path that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The map generator could not place every factory.
    #[error("Map generation gave up after {attempts} placement attempts ({placed}/{requested} factories placed)")]
    MapGeneration {
        /// Rejected and accepted samples drawn.
        attempts: u32,
        /// Factories placed before giving up.
        placed: usize,
        /// Factories requested.
        requested: usize,
    },

    /// A player id outside the match was referenced.
    #[error("Unknown player: {0}")]
    UnknownPlayer(PlayerId),

    /// A factory id outside the match was referenced.
    #[error("Unknown factory: {0}")]
    UnknownFactory(EntityId),

    /// A player's orders were fatal. The player has been eliminated.
    #[error("Player {player} eliminated: {source}")]
    RejectedOrders {
        /// The eliminated player.
        player: PlayerId,
        /// What was wrong with the orders.
        source: OrderError,
    },

    /// A snapshot could not be encoded or decoded.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Internal state broke an invariant. This is a defect, not a game event.
    #[error("Invariant violated in round {round}: {message}")]
    InvariantViolation {
        /// Round being resolved.
        round: u32,
        /// What went wrong.
        message: String,
    },
}

/// Classification of a fatal order, mirroring how hosts report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum OrderErrorKind {
    /// Text did not match any action shape.
    MalformedInput,
    /// A factory id was out of range.
    InvalidReference,
    /// The action broke a game rule (foreign source, degenerate route).
    RuleViolation,
}

/// A fatal problem in one player's orders. The player is eliminated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// The action text matched no known shape.
    #[error("Expected a valid action, got '{action}'")]
    Malformed {
        /// Offending action text.
        action: String,
    },

    /// A referenced factory id is not on the map.
    #[error("Expected 0 <= {role} < {factory_count}, got {id}")]
    OutOfRange {
        /// Which argument was wrong ("source" or "destination").
        role: &'static str,
        /// The referenced id.
        id: u32,
        /// Number of factories on the map.
        factory_count: usize,
    },

    /// The player acted from a factory they do not own.
    #[error("{verb} from factory {factory} which is not controlled by the player")]
    UnauthorizedSource {
        /// Action keyword.
        verb: &'static str,
        /// Source factory id.
        factory: EntityId,
    },

    /// Source and destination are the same factory.
    #[error("{verb} with identical source and destination {factory}")]
    DegenerateRoute {
        /// Action keyword.
        verb: &'static str,
        /// The factory used as both ends.
        factory: EntityId,
    },
}

impl OrderError {
    /// Kind of failure, for reporting.
    #[must_use]
    pub const fn kind(&self) -> OrderErrorKind {
        match self {
            Self::Malformed { .. } => OrderErrorKind::MalformedInput,
            Self::OutOfRange { .. } => OrderErrorKind::InvalidReference,
            Self::UnauthorizedSource { .. } | Self::DegenerateRoute { .. } => {
                OrderErrorKind::RuleViolation
            }
        }
    }
}
