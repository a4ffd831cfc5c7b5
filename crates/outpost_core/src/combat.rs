//! Battle and bomb resolution for a single factory.
//!
//! Battles are simultaneous: every troop arriving at a factory in the same
//! round is first pooled per player, the pools cancel each other unit for
//! unit, and only the surplus engages the garrison.

use serde::{Deserialize, Serialize};

use crate::config::{DAMAGE_DURATION, MIN_BOMB_DAMAGE, PLAYER_COUNT};
use crate::entities::{Factory, Owner, PlayerId};

/// Units arriving at one factory this round, per player.
pub type Arrivals = [u32; PLAYER_COUNT];

/// A change of hands caused by a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capture {
    /// The new owner.
    pub player: PlayerId,
    /// Who held the factory before.
    pub previous: Owner,
    /// Garrison left after the battle.
    pub units: u32,
}

/// Resolve all arrivals at `factory`.
///
/// Returns the capture, if the factory changed hands. With no arrivals the
/// factory is untouched.
pub fn resolve_battle(factory: &mut Factory, mut arrivals: Arrivals) -> Option<Capture> {
    // Attackers fight each other before the garrison.
    let clash = arrivals.iter().copied().min().unwrap_or(0);
    for units in &mut arrivals {
        *units -= clash;
    }

    let mut capture = None;
    for (idx, &surplus) in arrivals.iter().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let player = PlayerId(idx as u8);
        if factory.owner.is(player) {
            factory.units += surplus;
        } else if surplus > factory.units {
            let previous = factory.owner;
            factory.owner = Owner::Player(player);
            factory.units = surplus - factory.units;
            capture = Some(Capture {
                player,
                previous,
                units: factory.units,
            });
        } else {
            factory.units -= surplus;
        }
    }
    capture
}

/// Units a bomb destroys in a garrison of `stock`.
///
/// Half the garrison, at least [`MIN_BOMB_DAMAGE`], never more than what is
/// there.
#[must_use]
pub fn bomb_damage(stock: u32) -> u32 {
    stock.min(MIN_BOMB_DAMAGE.max(stock / 2))
}

/// Detonate a bomb on `factory`: destroy units and disable production.
/// Returns the damage dealt.
pub fn apply_bomb(factory: &mut Factory) -> u32 {
    let damage = bomb_damage(factory.units);
    factory.units -= damage;
    factory.disabled = DAMAGE_DURATION;
    damage
}
