//! Entity definitions: players, factories, and the troops and bombs in
//! flight between them.
//!
//! Entities are plain data owned by the [`MatchState`](crate::simulation::MatchState).
//! Cross references are ids, never pointers: a factory names its owner by
//! [`PlayerId`], a troop names its endpoints by factory id.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::MAX_PRODUCTION_RATE;
use crate::error::OrderErrorKind;
use crate::geometry::Point;
use crate::orders::TurnOrders;

/// Unique identifier for entities. Factories use `0..factory_count`.
pub type EntityId = u32;

/// Index of a player in the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// Position in per-player arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who holds a factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Owner {
    /// Nobody. Neutral factories do not produce.
    #[default]
    Neutral,
    /// A player.
    Player(PlayerId),
}

impl Owner {
    /// The owning player, if any.
    #[must_use]
    pub const fn player(self) -> Option<PlayerId> {
        match self {
            Self::Neutral => None,
            Self::Player(id) => Some(id),
        }
    }

    /// Whether `player` holds this.
    #[must_use]
    pub fn is(self, player: PlayerId) -> bool {
        self == Self::Player(player)
    }

    /// Ownership as seen by `viewer`: 1 mine, -1 theirs, 0 neutral.
    #[must_use]
    pub fn relative_to(self, viewer: PlayerId) -> i8 {
        match self {
            Self::Neutral => 0,
            Self::Player(id) if id == viewer => 1,
            Self::Player(_) => -1,
        }
    }
}

/// A stationary production site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Factory {
    /// Id, equal to the factory's index.
    pub id: EntityId,
    /// Current holder.
    pub owner: Owner,
    /// Position on the map. Never changes.
    pub position: Point,
    /// Garrison.
    pub units: u32,
    /// Units produced per round while enabled, `0..=3`.
    pub production_rate: u32,
    /// Rounds of disabled production remaining.
    pub disabled: u32,
}

impl Factory {
    /// Create a factory.
    #[must_use]
    pub const fn new(
        id: EntityId,
        owner: Owner,
        position: Point,
        units: u32,
        production_rate: u32,
    ) -> Self {
        Self {
            id,
            owner,
            position,
            units,
            production_rate,
            disabled: 0,
        }
    }

    /// Production this round: the rate, or 0 while disabled.
    #[must_use]
    pub const fn effective_production(&self) -> u32 {
        if self.disabled == 0 {
            self.production_rate
        } else {
            0
        }
    }

    /// Whether another increase is allowed.
    #[must_use]
    pub const fn can_grow(&self) -> bool {
        self.production_rate < MAX_PRODUCTION_RATE
    }
}

/// Source and destination of something in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    /// Launch factory.
    pub source: EntityId,
    /// Target factory.
    pub destination: EntityId,
}

impl Route {
    /// Create a route.
    #[must_use]
    pub const fn new(source: EntityId, destination: EntityId) -> Self {
        Self {
            source,
            destination,
        }
    }
}

/// Units travelling between factories.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Troop {
    /// Entity id.
    pub id: EntityId,
    /// Sender. Fixed for the troop's lifetime.
    pub owner: PlayerId,
    /// Where it travels.
    pub route: Route,
    /// Unit count, always positive.
    pub units: u32,
    /// Rounds until arrival.
    pub remaining_turns: u32,
}

impl Troop {
    /// Whether it reaches its destination this round.
    #[must_use]
    pub const fn has_arrived(&self) -> bool {
        self.remaining_turns == 0
    }
}

/// A bomb travelling toward a factory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bomb {
    /// Entity id.
    pub id: EntityId,
    /// Sender.
    pub owner: PlayerId,
    /// Where it travels.
    pub route: Route,
    /// Rounds until detonation.
    pub remaining_turns: u32,
}

impl Bomb {
    /// Whether it detonates this round.
    #[must_use]
    pub const fn has_arrived(&self) -> bool {
        self.remaining_turns == 0
    }
}

/// Why a player left the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Elimination {
    /// Sent an order that could not be accepted.
    FatalOrder(OrderErrorKind),
    /// Did not answer in time.
    TimedOut,
    /// No units left and no production to make more.
    Exhausted,
}

/// Per-player bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Player {
    /// Player index.
    pub id: PlayerId,
    /// Units owned in factories and troops, refreshed every round.
    pub score: u32,
    /// Bombs left to launch.
    pub remaining_bombs: u32,
    /// Message attached to the latest turn.
    pub message: Option<String>,
    /// Orders accepted for the coming round.
    pub orders: TurnOrders,
    /// Orders resolved in the latest round.
    pub last_orders: TurnOrders,
    /// Set once the player is out of the match.
    pub eliminated: Option<Elimination>,
}

impl Player {
    /// A fresh player with a full bomb budget.
    #[must_use]
    pub fn new(id: PlayerId, bombs: u32) -> Self {
        Self {
            id,
            score: 0,
            remaining_bombs: bombs,
            message: None,
            orders: TurnOrders::default(),
            last_orders: TurnOrders::default(),
            eliminated: None,
        }
    }

    /// Whether the player is still in the match.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.eliminated.is_none()
    }
}
