//! Test fixtures and helpers.
//!
//! Hand-built maps with exact distances, and a simple deterministic bot for
//! driving matches without scripting every round.

use outpost_core::config::Ruleset;
use outpost_core::distance::DistanceTable;
use outpost_core::entities::{EntityId, Factory, Owner, PlayerId};
use outpost_core::error::Result;
use outpost_core::geometry::Point;
use outpost_core::simulation::MatchState;

/// Player 0.
pub const P0: PlayerId = PlayerId(0);
/// Player 1.
pub const P1: PlayerId = PlayerId(1);

/// Builder for matches on hand-made maps.
///
/// Factories get ids in insertion order. Every pair is
/// [`default_distance`](Self::default_distance) apart unless overridden.
///
/// ```
/// use outpost_test_utils::fixtures::{MatchBuilder, P0, P1};
///
/// let state = MatchBuilder::new()
///     .owned(P0, 10, 1)
///     .owned(P1, 0, 0)
///     .distance(0, 1, 2)
///     .build();
/// assert_eq!(state.factories().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct MatchBuilder {
    factories: Vec<(Owner, u32, u32)>,
    links: Vec<(EntityId, EntityId, u32)>,
    default_distance: u32,
    rules: Ruleset,
}

impl Default for MatchBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchBuilder {
    /// Empty map, full rules, distance 3 between every pair.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: Vec::new(),
            links: Vec::new(),
            default_distance: 3,
            rules: Ruleset::default(),
        }
    }

    /// Add a factory.
    #[must_use]
    pub fn factory(mut self, owner: Owner, units: u32, rate: u32) -> Self {
        self.factories.push((owner, units, rate));
        self
    }

    /// Add a factory held by `player`.
    #[must_use]
    pub fn owned(self, player: PlayerId, units: u32, rate: u32) -> Self {
        self.factory(Owner::Player(player), units, rate)
    }

    /// Add a neutral factory.
    #[must_use]
    pub fn neutral(self, units: u32, rate: u32) -> Self {
        self.factory(Owner::Neutral, units, rate)
    }

    /// Set the travel time between two factories.
    #[must_use]
    pub fn distance(mut self, a: EntityId, b: EntityId, rounds: u32) -> Self {
        self.links.push((a, b, rounds));
        self
    }

    /// Travel time for pairs without an explicit [`distance`](Self::distance).
    #[must_use]
    pub const fn default_distance(mut self, rounds: u32) -> Self {
        self.default_distance = rounds;
        self
    }

    /// Replace the ruleset.
    #[must_use]
    pub const fn rules(mut self, rules: Ruleset) -> Self {
        self.rules = rules;
        self
    }

    /// Build the match.
    pub fn try_build(self) -> Result<MatchState> {
        let factories: Vec<Factory> = self
            .factories
            .iter()
            .enumerate()
            .map(|(idx, &(owner, units, rate))| {
                let id = EntityId::try_from(idx).unwrap_or(EntityId::MAX);
                // Positions are cosmetic; spread them along the x axis.
                let x = i32::try_from(idx).unwrap_or(0) * 1000 + 1000;
                Factory::new(id, owner, Point::new(x, 3250), units, rate)
            })
            .collect();

        let mut distances = DistanceTable::uniform(factories.len(), self.default_distance);
        for &(a, b, rounds) in &self.links {
            distances.set(a, b, rounds);
        }
        MatchState::from_parts(factories, distances, self.rules)
    }

    /// Build the match.
    ///
    /// # Panics
    ///
    /// Panics if the map is inconsistent (for example, a factory owned by a
    /// player outside the match).
    #[must_use]
    pub fn build(self) -> MatchState {
        match self.try_build() {
            Ok(state) => state,
            Err(err) => panic!("invalid fixture: {err}"),
        }
    }
}

/// Orders for a simple deterministic bot.
///
/// Every owned factory with more than 5 units sends half of them to the
/// closest factory it does not own. Factories with spare units upgrade
/// while they can. The first bomb goes at the enemy's biggest factory on
/// round 3.
#[must_use]
pub fn greedy_orders(state: &MatchState, player: PlayerId) -> String {
    let mut actions = Vec::new();
    let factories = state.factories();

    for source in factories.iter().filter(|f| f.owner.is(player)) {
        if source.units >= 20 && source.can_grow() {
            actions.push(format!("INC {}", source.id));
            continue;
        }
        if source.units <= 5 {
            continue;
        }
        let target = factories
            .iter()
            .filter(|f| !f.owner.is(player))
            .min_by_key(|f| (state.distances().get(source.id, f.id), f.id));
        if let Some(target) = target {
            actions.push(format!("MOVE {} {} {}", source.id, target.id, source.units / 2));
        }
    }

    if state.round() == 2 {
        let source = factories.iter().find(|f| f.owner.is(player));
        let target = factories
            .iter()
            .filter(|f| matches!(f.owner, Owner::Player(p) if p != player))
            .max_by_key(|f| (f.units, f.id));
        if let (Some(source), Some(target)) = (source, target) {
            actions.push(format!("BOMB {} {}", source.id, target.id));
        }
    }

    if actions.is_empty() {
        "WAIT".to_string()
    } else {
        actions.join(";")
    }
}

/// Play one round with [`greedy_orders`] for both players.
pub fn greedy_round(state: &mut MatchState) -> Result<()> {
    let orders: Vec<String> = [P0, P1]
        .iter()
        .map(|&player| greedy_orders(state, player))
        .collect();
    let outputs: Vec<Option<&str>> = orders.iter().map(|o| Some(o.as_str())).collect();
    state.play_round(&outputs)?;
    Ok(())
}
