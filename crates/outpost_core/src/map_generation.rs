//! Procedural map generation.
//!
//! Produces an odd number of factories laid out with 180-degree rotational
//! symmetry about the map centre:
//! - one neutral, non-producing factory at the centre
//! - one home factory per player, mirror images of each other
//! - neutral pairs, each factory a mirror of its twin
//!
//! Generation is fully determined by the [`MatchConfig`].

use serde::{Deserialize, Serialize};

use crate::config::{
    MatchConfig, EXTRA_SPACE_BETWEEN_FACTORIES, MAP_HEIGHT, MAP_WIDTH, MAX_PLACEMENT_ATTEMPTS,
    MAX_PRODUCTION_RATE, MIN_FACTORY_COUNT, MIN_PRODUCTION_RATE, MIN_TOTAL_PRODUCTION_RATE,
    PLAYER_INIT_UNITS_MAX, PLAYER_INIT_UNITS_MIN,
};
use crate::distance::DistanceTable;
use crate::entities::{EntityId, Factory, Owner, PlayerId};
use crate::error::{GameError, Result};
use crate::geometry::Point;
use crate::rng::MapRng;

/// Generated map data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedMap {
    /// Factories in id order.
    pub factories: Vec<Factory>,
    /// Travel times between factories.
    pub distances: DistanceTable,
    /// Radius shared by every factory on this map.
    pub factory_radius: u32,
}

impl GeneratedMap {
    /// The factory a player starts on.
    #[must_use]
    pub fn home_factory(&self, player: PlayerId) -> Option<&Factory> {
        self.factories.iter().find(|f| f.owner.is(player))
    }

    /// Sum of production rates over all factories.
    #[must_use]
    pub fn total_production(&self) -> u32 {
        self.factories.iter().map(|f| f.production_rate).sum()
    }
}

/// Factory radius for a map of `factory_count` factories.
#[must_use]
pub const fn factory_radius(factory_count: u32) -> u32 {
    if factory_count > 10 {
        600
    } else {
        700
    }
}

/// Generate a map from the given configuration.
///
/// # Errors
///
/// Returns [`GameError::InvalidConfig`] for an invalid ruleset and
/// [`GameError::MapGeneration`] if the factories cannot be spaced out within
/// the attempt budget.
pub fn generate_map(config: &MatchConfig) -> Result<GeneratedMap> {
    config.validate()?;
    let mut rng = MapRng::new(config.seed);

    let mut factory_count = match config.factory_count_hint() {
        Some(count) => count,
        None => rng.next_in_range(MIN_FACTORY_COUNT, config.rules.max_factory_count),
    };
    if factory_count % 2 == 0 {
        factory_count += 1;
    }

    let radius = factory_radius(factory_count);
    let factories = place_factories(config, &mut rng, factory_count, radius)?;
    let distances = DistanceTable::from_factories(&factories, radius);

    let map = GeneratedMap {
        factories,
        distances,
        factory_radius: radius,
    };
    tracing::info!(
        seed = config.seed,
        factories = factory_count,
        radius,
        total_production = map.total_production(),
        "Generated map"
    );
    Ok(map)
}

fn place_factories(
    config: &MatchConfig,
    rng: &mut MapRng,
    factory_count: u32,
    radius: u32,
) -> Result<Vec<Factory>> {
    let requested = factory_count as usize;
    let radius_i = i32::try_from(radius).unwrap_or(i32::MAX);
    let min_spacing = 2 * u64::from(radius + EXTRA_SPACE_BETWEEN_FACTORIES.unsigned_abs());
    let min_spacing_sq = min_spacing * min_spacing;

    // Sampling window: the left half of the map, kept clear of the edges.
    let x_span = (MAP_WIDTH / 2 - 2 * radius_i).unsigned_abs();
    let y_span = (MAP_HEIGHT - 2 * radius_i).unsigned_abs();
    let offset = radius_i + EXTRA_SPACE_BETWEEN_FACTORIES;

    let mut factories = Vec::with_capacity(requested);
    factories.push(Factory::new(0, Owner::Neutral, Point::CENTER, 0, 0));

    let mut attempts = 0u32;
    while factories.len() < requested {
        if attempts >= MAX_PLACEMENT_ATTEMPTS {
            return Err(GameError::MapGeneration {
                attempts,
                placed: factories.len(),
                requested,
            });
        }
        attempts += 1;

        let x = i32::try_from(rng.next_below(x_span)).unwrap_or(0) + offset;
        let y = i32::try_from(rng.next_below(y_span)).unwrap_or(0) + offset;
        let candidate = Point::new(x, y);

        let too_close = factories
            .iter()
            .any(|f| f.position.distance_squared(candidate) < min_spacing_sq);
        if too_close {
            continue;
        }

        let production_rate = rng.next_in_range(MIN_PRODUCTION_RATE, MAX_PRODUCTION_RATE);
        #[allow(clippy::cast_possible_truncation)]
        let id = factories.len() as EntityId;

        let (units, owners) = if factories.len() == 1 {
            let units = match config.initial_units_hint() {
                Some(units) => units,
                None => rng.next_in_range(PLAYER_INIT_UNITS_MIN, PLAYER_INIT_UNITS_MAX),
            };
            (
                units,
                [Owner::Player(PlayerId(0)), Owner::Player(PlayerId(1))],
            )
        } else {
            (
                rng.next_below(5 * production_rate + 1),
                [Owner::Neutral, Owner::Neutral],
            )
        };

        factories.push(Factory::new(id, owners[0], candidate, units, production_rate));
        factories.push(Factory::new(
            id + 1,
            owners[1],
            candidate.mirrored(),
            units,
            production_rate,
        ));
    }

    top_up_production(&mut factories);
    tracing::debug!(attempts, "Placed factories");
    Ok(factories)
}

/// Raise production rates, from factory 1 upward, until the map reaches the
/// minimum total. Twins are adjacent and share a rate, so pairs stay equal.
fn top_up_production(factories: &mut [Factory]) {
    let mut total: u32 = factories.iter().map(|f| f.production_rate).sum();
    for factory in factories.iter_mut().skip(1) {
        if total >= MIN_TOTAL_PRODUCTION_RATE {
            break;
        }
        if factory.can_grow() {
            factory.production_rate += 1;
            total += 1;
        }
    }
}
