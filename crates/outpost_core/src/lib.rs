//! # Outpost Core
//!
//! Deterministic simulation of a two-player factory war: factories on a
//! symmetric map produce units, players send troops and bombs between them,
//! and whoever runs out of both units and production loses.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO beyond loading a config file
//! - No system randomness (maps come from a seeded generator)
//! - No floating-point math
//!
//! ## Crate Structure
//!
//! - [`config`] - Match configuration and league presets
//! - [`map_generation`] - Seeded symmetric map generator
//! - [`orders`] - Player order parsing and validation
//! - [`simulation`] - Match state and round engine
//! - [`systems`] - Order-independent round phases
//! - [`protocol`] / [`view`] - What players and viewers see

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod combat;
pub mod config;
pub mod distance;
pub mod entities;
pub mod error;
pub mod geometry;
pub mod map_generation;
pub mod orders;
pub mod protocol;
pub mod rng;
pub mod simulation;
pub mod systems;
pub mod victory;
pub mod view;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{League, MatchConfig, Ruleset};
    pub use crate::distance::DistanceTable;
    pub use crate::entities::{
        Bomb, Elimination, EntityId, Factory, Owner, Player, PlayerId, Route, Troop,
    };
    pub use crate::error::{GameError, OrderError, OrderErrorKind, Result};
    pub use crate::geometry::Point;
    pub use crate::map_generation::{generate_map, GeneratedMap};
    pub use crate::orders::{parse_orders, OrderContext, TurnOrders};
    pub use crate::simulation::{MatchState, RoundEvent, RoundReport};
    pub use crate::victory::{Outcome, Verdict};
    pub use crate::view::{ViewFrame, ViewInit};
}
