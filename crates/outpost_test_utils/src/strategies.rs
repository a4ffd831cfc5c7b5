//! Proptest strategies for map, order and match inputs.
//!
//! These strategies generate random but reproducible inputs for
//! property-based tests of the core.

use proptest::prelude::*;

use outpost_core::config::{League, MatchConfig, Ruleset};
use outpost_core::entities::PlayerId;

/// Any seed.
pub fn arb_seed() -> impl Strategy<Value = u64> {
    any::<u64>()
}

/// One of the league presets.
pub fn arb_league() -> impl Strategy<Value = League> {
    prop_oneof![
        Just(League::Wood3),
        Just(League::Wood2),
        Just(League::Wood1),
        Just(League::Bronze),
    ]
}

/// Rules from a league preset.
pub fn arb_ruleset() -> impl Strategy<Value = Ruleset> {
    arb_league().prop_map(Ruleset::for_league)
}

/// Match config with random seed, rules and (possibly out-of-range) hints.
pub fn arb_match_config() -> impl Strategy<Value = MatchConfig> {
    (
        arb_seed(),
        arb_ruleset(),
        proptest::option::of(0u32..20),
        proptest::option::of(0u32..40),
    )
        .prop_map(|(seed, rules, factories, units)| MatchConfig {
            seed,
            factory_count: factories,
            initial_unit_count: units,
            rules,
        })
}

/// A player index in the match.
pub fn arb_player() -> impl Strategy<Value = PlayerId> {
    (0u8..2).prop_map(PlayerId)
}

/// A single well-formed action against a map of `factory_count`
/// factories. Ids may still be out of range or unowned.
pub fn arb_action(factory_count: u32) -> impl Strategy<Value = String> {
    let id = 0..factory_count + 2;
    prop_oneof![
        Just("WAIT".to_string()),
        (id.clone(), id.clone(), 0u32..40).prop_map(|(s, d, u)| format!("MOVE {s} {d} {u}")),
        (id.clone(), id.clone()).prop_map(|(s, d)| format!("BOMB {s} {d}")),
        id.prop_map(|s| format!("INC {s}")),
        "[a-z][a-z ]{0,19}".prop_map(|text| format!("MSG {text}")),
    ]
}

/// A turn of well-formed actions joined with `;`.
pub fn arb_turn(factory_count: u32) -> impl Strategy<Value = String> {
    proptest::collection::vec(arb_action(factory_count), 1..6).prop_map(|a| a.join(";"))
}

/// Arbitrary text, mostly garbage, sometimes close to valid.
pub fn arb_raw_output() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<String>(),
        "(MOVE|BOMB|INC|WAIT|MSG|move|wait)( -?[0-9]{1,10}){0,4}(;.{0,10})?",
        "[A-Z0-9 ;\n]{0,40}",
    ]
}
