//! Snapshots for viewers and replays.
//!
//! Unlike player input these are absolute (real owner ids, no hidden
//! bomb targets) and carry the player messages.

use serde::{Deserialize, Serialize};

use crate::config::{MAP_HEIGHT, MAP_WIDTH};
use crate::entities::{EntityId, PlayerId};
use crate::geometry::Point;
use crate::simulation::MatchState;

/// Static layout of one factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryLayout {
    /// Factory id.
    pub id: EntityId,
    /// Production rate at match start.
    pub production_rate: u32,
    /// Position.
    pub position: Point,
    /// Radius.
    pub radius: u32,
}

/// Sent once before the first frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewInit {
    /// Map width.
    pub width: i32,
    /// Map height.
    pub height: i32,
    /// Number of factories.
    pub factory_count: usize,
    /// Bombs each player starts with.
    pub bombs_per_player: u32,
    /// Factory layout in id order.
    pub factories: Vec<FactoryLayout>,
}

impl ViewInit {
    /// Capture the layout of a match.
    #[must_use]
    pub fn capture(state: &MatchState) -> Self {
        Self {
            width: MAP_WIDTH,
            height: MAP_HEIGHT,
            factory_count: state.factories().len(),
            bombs_per_player: state.rules().bombs_per_player,
            factories: state
                .factories()
                .iter()
                .map(|f| FactoryLayout {
                    id: f.id,
                    production_rate: f.production_rate,
                    position: f.position,
                    radius: state.factory_radius(),
                })
                .collect(),
        }
    }
}

/// Per-player line of a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    /// Current score.
    pub score: u32,
    /// Bombs left.
    pub remaining_bombs: u32,
    /// Latest message, if any.
    pub message: Option<String>,
}

/// A troop or bomb launched this round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchView {
    /// Entity id.
    pub id: EntityId,
    /// Sender.
    pub owner: PlayerId,
    /// Launch factory.
    pub source: EntityId,
    /// Target factory.
    pub destination: EntityId,
    /// Units carried; 0 for bombs.
    pub units: u32,
    /// Rounds until arrival.
    pub remaining_turns: u32,
}

/// Dynamic state of one factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryView {
    /// Holder, `None` for neutral.
    pub owner: Option<PlayerId>,
    /// Garrison.
    pub units: u32,
    /// Production rate.
    pub production_rate: u32,
    /// Rounds of disabled production left.
    pub disabled: u32,
}

/// State after one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewFrame {
    /// Round just resolved.
    pub round: u32,
    /// Players in id order.
    pub players: Vec<PlayerView>,
    /// Troops created this round.
    pub new_troops: Vec<LaunchView>,
    /// Bombs created this round.
    pub new_bombs: Vec<LaunchView>,
    /// Factories in id order.
    pub factories: Vec<FactoryView>,
}

impl ViewFrame {
    /// Capture the current state of a match.
    #[must_use]
    pub fn capture(state: &MatchState) -> Self {
        Self {
            round: state.round(),
            players: state
                .players()
                .iter()
                .map(|p| PlayerView {
                    score: p.score,
                    remaining_bombs: p.remaining_bombs,
                    message: p.message.clone(),
                })
                .collect(),
            new_troops: state
                .new_troops()
                .map(|t| LaunchView {
                    id: t.id,
                    owner: t.owner,
                    source: t.route.source,
                    destination: t.route.destination,
                    units: t.units,
                    remaining_turns: t.remaining_turns,
                })
                .collect(),
            new_bombs: state
                .new_bombs()
                .map(|b| LaunchView {
                    id: b.id,
                    owner: b.owner,
                    source: b.route.source,
                    destination: b.route.destination,
                    units: 0,
                    remaining_turns: b.remaining_turns,
                })
                .collect(),
            factories: state
                .factories()
                .iter()
                .map(|f| FactoryView {
                    owner: f.owner.player(),
                    units: f.units,
                    production_rate: f.production_rate,
                    disabled: f.disabled,
                })
                .collect(),
        }
    }
}
