//! Match configuration and rule presets.
//!
//! A [`MatchConfig`] carries the per-match inputs (seed, optional factory and
//! unit hints) and the per-deployment [`Ruleset`]. Both load from RON:
//!
//! ```ron
//! MatchConfig(
//!     seed: 1234,
//!     factory_count: Some(11),
//!     initial_unit_count: None,
//!     rules: Ruleset(
//!         max_factory_count: 15,
//!         move_restriction: false,
//!         bombs_per_player: 2,
//!         increase_enabled: true,
//!         max_rounds: 200,
//!     ),
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Map width in world units.
pub const MAP_WIDTH: i32 = 16_000;
/// Map height in world units.
pub const MAP_HEIGHT: i32 = 6_500;
/// Smallest factory count a map can have.
pub const MIN_FACTORY_COUNT: u32 = 7;
/// Largest factory count any ruleset may ask for.
pub const FACTORY_COUNT_LIMIT: u32 = 15;
/// Lowest production rate.
pub const MIN_PRODUCTION_RATE: u32 = 0;
/// Highest production rate.
pub const MAX_PRODUCTION_RATE: u32 = 3;
/// Generated maps are topped up to at least this much total production.
pub const MIN_TOTAL_PRODUCTION_RATE: u32 = 4;
/// Lowest starting garrison of a home factory.
pub const PLAYER_INIT_UNITS_MIN: u32 = 15;
/// Highest starting garrison of a home factory.
pub const PLAYER_INIT_UNITS_MAX: u32 = 30;
/// Gap kept between factory rims, and from the map edge.
pub const EXTRA_SPACE_BETWEEN_FACTORIES: i32 = 300;
/// Units paid to raise production by one.
pub const COST_INCREASE_PRODUCTION: u32 = 10;
/// Rounds a bombed factory stays disabled.
pub const DAMAGE_DURATION: u32 = 5;
/// Minimum damage a bomb deals (capped by the garrison).
pub const MIN_BOMB_DAMAGE: u32 = 10;
/// World units travelled per round.
pub const DISTANCE_PER_ROUND: u32 = 800;
/// Longest message a player may attach to a turn.
pub const MAX_MESSAGE_LEN: usize = 100;
/// Players in a match.
pub const PLAYER_COUNT: usize = 2;
/// Default round cap.
pub const DEFAULT_MAX_ROUNDS: u32 = 200;
/// Placement samples drawn before map generation gives up.
pub const MAX_PLACEMENT_ATTEMPTS: u32 = 100_000;

/// Named rule presets, in order of unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum League {
    /// One move per turn, few factories, no bombs, no increase.
    Wood3,
    /// Multiple moves per turn, more factories.
    Wood2,
    /// Adds bombs.
    Wood1,
    /// Adds the increase action. Full rules.
    #[default]
    Bronze,
}

/// Per-deployment rule toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ruleset {
    /// Upper bound on the factory count (odd, within `7..=15`).
    pub max_factory_count: u32,
    /// Only the first MOVE of a turn is kept.
    pub move_restriction: bool,
    /// Bombs each player may launch over the whole match.
    pub bombs_per_player: u32,
    /// Whether INC orders are honoured.
    pub increase_enabled: bool,
    /// Round cap enforced by the host.
    pub max_rounds: u32,
}

impl Default for Ruleset {
    fn default() -> Self {
        Self::for_league(League::default())
    }
}

impl Ruleset {
    /// Rules for a league preset.
    #[must_use]
    pub const fn for_league(league: League) -> Self {
        let (max_factory_count, move_restriction, bombs_per_player, increase_enabled) =
            match league {
                League::Wood3 => (9, true, 0, false),
                League::Wood2 => (15, false, 0, false),
                League::Wood1 => (15, false, 2, false),
                League::Bronze => (15, false, 2, true),
            };
        Self {
            max_factory_count,
            move_restriction,
            bombs_per_player,
            increase_enabled,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    /// Check the rules describe a playable match.
    pub fn validate(&self) -> Result<()> {
        if self.max_factory_count < MIN_FACTORY_COUNT
            || self.max_factory_count > FACTORY_COUNT_LIMIT
        {
            return Err(GameError::InvalidConfig(format!(
                "max_factory_count must be within {MIN_FACTORY_COUNT}..={FACTORY_COUNT_LIMIT}, got {}",
                self.max_factory_count
            )));
        }
        if self.max_factory_count % 2 == 0 {
            return Err(GameError::InvalidConfig(format!(
                "max_factory_count must be odd, got {}",
                self.max_factory_count
            )));
        }
        if self.max_rounds == 0 {
            return Err(GameError::InvalidConfig(
                "max_rounds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Everything needed to start one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Seed for map generation.
    pub seed: u64,
    /// Requested factory count; ignored unless within range.
    #[serde(default)]
    pub factory_count: Option<u32>,
    /// Requested home garrison; ignored unless within range.
    #[serde(default)]
    pub initial_unit_count: Option<u32>,
    /// Rule toggles.
    #[serde(default)]
    pub rules: Ruleset,
}

impl MatchConfig {
    /// Config with default rules and no hints.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            factory_count: None,
            initial_unit_count: None,
            rules: Ruleset::default(),
        }
    }

    /// Request a factory count.
    #[must_use]
    pub const fn with_factory_count(mut self, count: u32) -> Self {
        self.factory_count = Some(count);
        self
    }

    /// Request a home garrison size.
    #[must_use]
    pub const fn with_initial_units(mut self, units: u32) -> Self {
        self.initial_unit_count = Some(units);
        self
    }

    /// Replace the ruleset.
    #[must_use]
    pub const fn with_rules(mut self, rules: Ruleset) -> Self {
        self.rules = rules;
        self
    }

    /// The factory-count hint, if it is within the allowed range.
    #[must_use]
    pub fn factory_count_hint(&self) -> Option<u32> {
        self.factory_count
            .filter(|n| (MIN_FACTORY_COUNT..=self.rules.max_factory_count).contains(n))
    }

    /// The initial-unit hint, if it is within the allowed range.
    #[must_use]
    pub fn initial_units_hint(&self) -> Option<u32> {
        self.initial_unit_count
            .filter(|n| (PLAYER_INIT_UNITS_MIN..=PLAYER_INIT_UNITS_MAX).contains(n))
    }

    /// Validate the ruleset. Hints are never an error; out-of-range hints
    /// fall back to random values at generation time.
    pub fn validate(&self) -> Result<()> {
        self.rules.validate()
    }

    /// Parse and validate a config from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let config: Self = ron::from_str(ron)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| GameError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn league_presets() {
        let wood3 = Ruleset::for_league(League::Wood3);
        assert_eq!(wood3.max_factory_count, 9);
        assert!(wood3.move_restriction);
        assert_eq!(wood3.bombs_per_player, 0);
        assert!(!wood3.increase_enabled);

        let bronze = Ruleset::default();
        assert_eq!(bronze, Ruleset::for_league(League::Bronze));
        assert_eq!(bronze.bombs_per_player, 2);
        assert!(bronze.increase_enabled);
        assert_eq!(bronze.max_rounds, DEFAULT_MAX_ROUNDS);
    }

    #[test]
    fn presets_are_valid() {
        for league in [League::Wood3, League::Wood2, League::Wood1, League::Bronze] {
            assert!(Ruleset::for_league(league).validate().is_ok());
        }
    }

    #[test]
    fn rejects_even_or_out_of_range_max() {
        let mut rules = Ruleset::default();
        rules.max_factory_count = 12;
        assert!(rules.validate().is_err());
        rules.max_factory_count = 5;
        assert!(rules.validate().is_err());
        rules.max_factory_count = 17;
        assert!(rules.validate().is_err());
    }

    #[test]
    fn hints_outside_range_are_ignored() {
        let config = MatchConfig::new(1).with_factory_count(3).with_initial_units(99);
        assert_eq!(config.factory_count_hint(), None);
        assert_eq!(config.initial_units_hint(), None);

        let config = MatchConfig::new(1).with_factory_count(11).with_initial_units(20);
        assert_eq!(config.factory_count_hint(), Some(11));
        assert_eq!(config.initial_units_hint(), Some(20));
    }

    #[test]
    fn factory_hint_respects_league_max() {
        let config = MatchConfig::new(1)
            .with_rules(Ruleset::for_league(League::Wood3))
            .with_factory_count(13);
        assert_eq!(config.factory_count_hint(), None);
    }

    #[test]
    fn parses_ron_with_defaults() {
        let config = MatchConfig::from_ron_str("MatchConfig(seed: 99)").unwrap();
        assert_eq!(config.seed, 99);
        assert_eq!(config.factory_count, None);
        assert_eq!(config.rules, Ruleset::default());
    }

    #[test]
    fn parses_full_ron() {
        let ron = r"MatchConfig(
            seed: 5,
            factory_count: Some(9),
            initial_unit_count: Some(18),
            rules: Ruleset(
                max_factory_count: 9,
                move_restriction: true,
                bombs_per_player: 0,
                increase_enabled: false,
                max_rounds: 50,
            ),
        )";
        let config = MatchConfig::from_ron_str(ron).unwrap();
        assert_eq!(config.factory_count_hint(), Some(9));
        assert_eq!(config.rules.max_rounds, 50);
        assert!(config.rules.move_restriction);
    }

    #[test]
    fn invalid_ron_rules_are_rejected() {
        let ron = r"MatchConfig(
            seed: 5,
            rules: Ruleset(
                max_factory_count: 10,
                move_restriction: false,
                bombs_per_player: 2,
                increase_enabled: true,
                max_rounds: 200,
            ),
        )";
        assert!(matches!(
            MatchConfig::from_ron_str(ron),
            Err(GameError::InvalidConfig(_))
        ));
    }

    #[test]
    fn malformed_ron_is_parse_error() {
        assert!(matches!(
            MatchConfig::from_ron_str("MatchConfig(seed: )"),
            Err(GameError::ConfigParse(_))
        ));
    }
}
