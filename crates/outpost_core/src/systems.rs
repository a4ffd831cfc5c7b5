//! Round phases that need no order input.
//!
//! Each function runs one phase over plain entity slices. Order execution
//! lives on [`MatchState`](crate::simulation::MatchState) because it needs
//! the id allocator and player budgets.

use crate::combat::{apply_bomb, resolve_battle, Arrivals, Capture};
use crate::config::PLAYER_COUNT;
use crate::entities::{Bomb, EntityId, Factory, Owner, Player, PlayerId, Troop};
use crate::error::{GameError, Result};

/// A factory that changed hands this round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureEvent {
    /// Captured factory.
    pub factory: EntityId,
    /// Details of the capture.
    pub capture: Capture,
}

/// A bomb that went off this round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detonation {
    /// The bomb.
    pub bomb: EntityId,
    /// Who launched it.
    pub owner: PlayerId,
    /// Target factory.
    pub factory: EntityId,
    /// Holder of the target at detonation.
    pub target_owner: Owner,
    /// Units destroyed.
    pub damage: u32,
}

fn violation(round: u32, message: impl Into<String>) -> GameError {
    GameError::InvariantViolation {
        round,
        message: message.into(),
    }
}

/// Move every troop and bomb one round closer to its destination.
pub fn movement_system(troops: &mut [Troop], bombs: &mut [Bomb], round: u32) -> Result<()> {
    for troop in troops.iter_mut() {
        troop.remaining_turns = troop
            .remaining_turns
            .checked_sub(1)
            .ok_or_else(|| violation(round, format!("troop {} moved past arrival", troop.id)))?;
    }
    for bomb in bombs.iter_mut() {
        bomb.remaining_turns = bomb
            .remaining_turns
            .checked_sub(1)
            .ok_or_else(|| violation(round, format!("bomb {} moved past arrival", bomb.id)))?;
    }
    Ok(())
}

/// Count down disabled production.
pub fn recovery_system(factories: &mut [Factory]) {
    for factory in factories.iter_mut() {
        factory.disabled = factory.disabled.saturating_sub(1);
    }
}

/// Owned factories produce at their effective rate. Returns units produced.
pub fn production_system(factories: &mut [Factory], round: u32) -> Result<u32> {
    let mut produced = 0u32;
    for factory in factories.iter_mut().filter(|f| f.owner != Owner::Neutral) {
        let amount = factory.effective_production();
        factory.units = factory
            .units
            .checked_add(amount)
            .ok_or_else(|| violation(round, format!("factory {} garrison overflow", factory.id)))?;
        produced += amount;
    }
    Ok(produced)
}

/// Remove arrived troops and pool their units per destination and owner.
pub fn arrival_system(
    troops: &mut Vec<Troop>,
    factory_count: usize,
    round: u32,
) -> Result<Vec<Arrivals>> {
    let mut arrivals = vec![[0u32; PLAYER_COUNT]; factory_count];
    let mut error = None;

    troops.retain(|troop| {
        if !troop.has_arrived() || error.is_some() {
            return true;
        }
        let slot = arrivals
            .get_mut(troop.route.destination as usize)
            .and_then(|pool| pool.get_mut(troop.owner.index()));
        match slot {
            Some(slot) => *slot += troop.units,
            None => {
                error = Some(violation(
                    round,
                    format!("troop {} arrived at unknown factory or owner", troop.id),
                ));
            }
        }
        false
    });

    match error {
        Some(err) => Err(err),
        None => Ok(arrivals),
    }
}

/// Fight every pooled arrival against its factory.
pub fn battle_system(factories: &mut [Factory], arrivals: &[Arrivals]) -> Vec<CaptureEvent> {
    factories
        .iter_mut()
        .zip(arrivals)
        .filter_map(|(factory, &pool)| {
            resolve_battle(factory, pool).map(|capture| CaptureEvent {
                factory: factory.id,
                capture,
            })
        })
        .collect()
}

/// Detonate arrived bombs and remove them.
pub fn bomb_system(
    bombs: &mut Vec<Bomb>,
    factories: &mut [Factory],
    round: u32,
) -> Result<Vec<Detonation>> {
    let mut detonations = Vec::new();
    for bomb in bombs.iter().filter(|b| b.has_arrived()) {
        let factory = factories
            .get_mut(bomb.route.destination as usize)
            .ok_or_else(|| violation(round, format!("bomb {} targets unknown factory", bomb.id)))?;
        let target_owner = factory.owner;
        let damage = apply_bomb(factory);
        detonations.push(Detonation {
            bomb: bomb.id,
            owner: bomb.owner,
            factory: factory.id,
            target_owner,
            damage,
        });
    }
    bombs.retain(|b| !b.has_arrived());
    Ok(detonations)
}

/// Recompute every live player's score: garrisons plus troops in flight.
pub fn score_system(
    factories: &[Factory],
    troops: &[Troop],
    players: &mut [Player],
    round: u32,
) -> Result<()> {
    let mut scores = [0u32; PLAYER_COUNT];
    let owned = factories
        .iter()
        .filter_map(|f| f.owner.player().map(|p| (p, f.units)));
    let flying = troops.iter().map(|t| (t.owner, t.units));

    for (player, units) in owned.chain(flying) {
        let score = scores
            .get_mut(player.index())
            .ok_or_else(|| violation(round, format!("unknown owner {player}")))?;
        *score += units;
    }

    for player in players.iter_mut() {
        player.score = scores.get(player.id.index()).copied().unwrap_or(0);
    }
    Ok(())
}
