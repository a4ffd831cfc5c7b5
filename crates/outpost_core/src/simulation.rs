//! Match state and the round engine.
//!
//! A [`MatchState`] owns everything about one match: the map, every entity
//! in flight, per-player bookkeeping and the entity id allocator. Rounds
//! advance through [`MatchState::step`] once every player's orders have
//! been submitted (or timed out).
//!
//! # Determinism
//!
//! - No floating point, no system randomness.
//! - Entities live in `Vec`s in creation order.
//! - Players are processed in ascending id wherever order matters.
//!
//! # Example
//!
//! ```
//! use outpost_core::config::MatchConfig;
//! use outpost_core::simulation::MatchState;
//!
//! let mut state = MatchState::new(&MatchConfig::new(7)).unwrap();
//! let report = state.play_round(&[Some("WAIT"), Some("WAIT")]).unwrap();
//! assert_eq!(report.round, 1);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::config::{MatchConfig, Ruleset, COST_INCREASE_PRODUCTION, PLAYER_COUNT};
use crate::distance::DistanceTable;
use crate::entities::{Bomb, Elimination, EntityId, Factory, Owner, Player, PlayerId, Route, Troop};
use crate::error::{GameError, Result};
use crate::map_generation::{factory_radius, generate_map, GeneratedMap};
use crate::orders::{parse_orders, BombOrder, IncreaseOrder, MoveOrder, OrderContext, TurnOrders};
use crate::systems::{
    arrival_system, battle_system, bomb_system, movement_system, production_system,
    recovery_system, score_system,
};
use crate::victory::{check_victory, exhausted_players, outcome_by_score, Outcome, Verdict};

/// Something that happened during a round.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundEvent {
    /// A bomb left its factory.
    BombLaunched {
        /// Sender.
        player: PlayerId,
        /// New bomb id.
        bomb: EntityId,
        /// Where it flies.
        route: Route,
    },
    /// Units left a factory. Same-route moves share one troop.
    TroopDispatched {
        /// Sender.
        player: PlayerId,
        /// Troop carrying the units.
        troop: EntityId,
        /// Where it travels.
        route: Route,
        /// Units added by this order.
        units: u32,
    },
    /// A move on the same route as a bomb launched this round. The units
    /// were already taken from the garrison and are lost.
    MoveBlockedByBomb {
        /// Sender.
        player: PlayerId,
        /// Route shared with the bomb.
        route: Route,
        /// Units lost.
        units: u32,
    },
    /// A factory's rate went up by one.
    ProductionIncreased {
        /// Who paid.
        player: PlayerId,
        /// Upgraded factory.
        factory: EntityId,
        /// New rate.
        rate: u32,
    },
    /// A factory changed hands in battle.
    FactoryCaptured {
        /// New owner.
        player: PlayerId,
        /// Captured factory.
        factory: EntityId,
        /// Owner before the battle.
        previous: Owner,
        /// Garrison left.
        units: u32,
    },
    /// A bomb reached its target.
    BombDetonated {
        /// Sender.
        owner: PlayerId,
        /// Bomb id.
        bomb: EntityId,
        /// Target factory.
        factory: EntityId,
        /// Holder of the target when it went off.
        target_owner: Owner,
        /// Units destroyed.
        damage: u32,
    },
    /// A player left the match.
    PlayerEliminated {
        /// Eliminated player.
        player: PlayerId,
        /// Why.
        reason: Elimination,
    },
}

impl RoundEvent {
    /// Whether `player` took part in this event.
    #[must_use]
    pub fn involves(&self, player: PlayerId) -> bool {
        match *self {
            Self::BombLaunched { player: p, .. }
            | Self::TroopDispatched { player: p, .. }
            | Self::MoveBlockedByBomb { player: p, .. }
            | Self::ProductionIncreased { player: p, .. }
            | Self::PlayerEliminated { player: p, .. } => p == player,
            Self::FactoryCaptured {
                player: p,
                previous,
                ..
            } => p == player || previous.is(player),
            Self::BombDetonated {
                owner,
                target_owner,
                ..
            } => owner == player || target_owner.is(player),
        }
    }
}

/// Result of one call to [`MatchState::step`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundReport {
    /// Round just resolved.
    pub round: u32,
    /// Units created by production.
    pub produced: u32,
    /// Events in the order they happened.
    pub events: Vec<RoundEvent>,
    /// Match status after the round.
    pub verdict: Verdict,
}

impl RoundReport {
    /// Events `player` took part in.
    pub fn events_for(&self, player: PlayerId) -> impl Iterator<Item = &RoundEvent> + '_ {
        self.events.iter().filter(move |e| e.involves(player))
    }
}

/// Complete state of one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    round: u32,
    rules: Ruleset,
    factory_radius: u32,
    factories: Vec<Factory>,
    distances: DistanceTable,
    troops: Vec<Troop>,
    bombs: Vec<Bomb>,
    players: Vec<Player>,
    /// Troops and bombs created during the latest round.
    new_troops: Vec<EntityId>,
    new_bombs: Vec<EntityId>,
    next_entity_id: EntityId,
    /// Eliminations from order submission, reported with the next round.
    pending_events: Vec<RoundEvent>,
    verdict: Verdict,
}

impl MatchState {
    /// Generate a map and set up a match on it.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or map generation gives up.
    pub fn new(config: &MatchConfig) -> Result<Self> {
        let map = generate_map(config)?;
        Self::from_map(map, config.rules)
    }

    /// Set up a match on an already generated map.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvariantViolation`] if a factory belongs to a
    /// player outside the match.
    pub fn from_map(map: GeneratedMap, rules: Ruleset) -> Result<Self> {
        let GeneratedMap {
            factories,
            distances,
            factory_radius,
        } = map;
        Self::assemble(factories, distances, factory_radius, rules)
    }

    /// Set up a match on a hand-built map.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] if factory ids do not match
    /// their positions, the distance table has the wrong size or a zero
    /// distance between two factories, or a factory belongs to a player
    /// outside the match.
    pub fn from_parts(
        factories: Vec<Factory>,
        distances: DistanceTable,
        rules: Ruleset,
    ) -> Result<Self> {
        if distances.len() != factories.len() {
            return Err(GameError::InvalidConfig(format!(
                "distance table covers {} factories, map has {}",
                distances.len(),
                factories.len()
            )));
        }
        if let Some((a, b, _)) = distances.links().find(|&(_, _, d)| d == 0) {
            return Err(GameError::InvalidConfig(format!(
                "factories {a} and {b} are at distance 0"
            )));
        }
        for (idx, factory) in factories.iter().enumerate() {
            if factory.id as usize != idx {
                return Err(GameError::InvalidConfig(format!(
                    "factory at index {idx} has id {}",
                    factory.id
                )));
            }
            if let Some(player) = factory.owner.player() {
                if player.index() >= PLAYER_COUNT {
                    return Err(GameError::InvalidConfig(format!(
                        "factory {} owned by unknown player {player}",
                        factory.id
                    )));
                }
            }
        }
        #[allow(clippy::cast_possible_truncation)]
        let radius = factory_radius(factories.len() as u32);
        Self::assemble(factories, distances, radius, rules)
    }

    fn assemble(
        factories: Vec<Factory>,
        distances: DistanceTable,
        factory_radius: u32,
        rules: Ruleset,
    ) -> Result<Self> {
        #[allow(clippy::cast_possible_truncation)]
        let players = (0..PLAYER_COUNT)
            .map(|i| Player::new(PlayerId(i as u8), rules.bombs_per_player))
            .collect();
        #[allow(clippy::cast_possible_truncation)]
        let next_entity_id = factories.len() as EntityId;

        let mut state = Self {
            round: 0,
            rules,
            factory_radius,
            factories,
            distances,
            troops: Vec::new(),
            bombs: Vec::new(),
            players,
            new_troops: Vec::new(),
            new_bombs: Vec::new(),
            next_entity_id,
            pending_events: Vec::new(),
            verdict: Verdict::Ongoing,
        };
        // Scores start from the initial garrisons.
        score_system(&state.factories, &state.troops, &mut state.players, 0)?;
        Ok(state)
    }

    // -- Accessors -----------------------------------------------------------

    /// Rounds resolved so far.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// Rule toggles in force.
    #[must_use]
    pub const fn rules(&self) -> &Ruleset {
        &self.rules
    }

    /// Radius shared by every factory.
    #[must_use]
    pub const fn factory_radius(&self) -> u32 {
        self.factory_radius
    }

    /// All factories in id order.
    #[must_use]
    pub fn factories(&self) -> &[Factory] {
        &self.factories
    }

    /// One factory.
    #[must_use]
    pub fn factory(&self, id: EntityId) -> Option<&Factory> {
        self.factories.get(id as usize)
    }

    /// Travel times.
    #[must_use]
    pub const fn distances(&self) -> &DistanceTable {
        &self.distances
    }

    /// Troops in flight, oldest first.
    #[must_use]
    pub fn troops(&self) -> &[Troop] {
        &self.troops
    }

    /// Bombs in flight, oldest first.
    #[must_use]
    pub fn bombs(&self) -> &[Bomb] {
        &self.bombs
    }

    /// All players in id order.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// One player.
    pub fn player(&self, id: PlayerId) -> Result<&Player> {
        self.players
            .get(id.index())
            .ok_or(GameError::UnknownPlayer(id))
    }

    /// Troops created in the latest round.
    pub fn new_troops(&self) -> impl Iterator<Item = &Troop> + '_ {
        self.troops
            .iter()
            .filter(|t| self.new_troops.contains(&t.id))
    }

    /// Bombs created in the latest round that are still in flight.
    pub fn new_bombs(&self) -> impl Iterator<Item = &Bomb> + '_ {
        self.bombs.iter().filter(|b| self.new_bombs.contains(&b.id))
    }

    /// Status after the latest round.
    #[must_use]
    pub const fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// Whether no further rounds will be played.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.verdict.is_over()
    }

    /// The outcome now: the verdict if the match is over, otherwise the
    /// score leader. Used when a host stops at its round cap.
    #[must_use]
    pub fn final_outcome(&self) -> Outcome {
        match self.verdict {
            Verdict::MatchOver(outcome) => outcome,
            Verdict::Ongoing => outcome_by_score(&self.players),
        }
    }

    /// Current scores, indexed by player.
    #[must_use]
    pub fn scores(&self) -> Vec<u32> {
        self.players.iter().map(|p| p.score).collect()
    }

    // -- Order intake ---------------------------------------------------------

    /// Parse and store one player's orders for the coming round.
    ///
    /// Orders from an eliminated player are ignored.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownPlayer`] for an id outside the match, and
    /// [`GameError::RejectedOrders`] if the orders are fatal. In that case
    /// the player has already been eliminated.
    pub fn submit_orders(&mut self, player: PlayerId, raw: &str) -> Result<()> {
        let slot = self
            .players
            .get_mut(player.index())
            .ok_or(GameError::UnknownPlayer(player))?;
        if !slot.is_alive() {
            tracing::debug!(%player, "Ignoring orders from eliminated player");
            return Ok(());
        }
        slot.message = None;
        slot.orders = TurnOrders::default();

        let ctx = OrderContext {
            player,
            factories: &self.factories,
            rules: &self.rules,
        };
        match parse_orders(raw, &ctx) {
            Ok(orders) => {
                let slot = &mut self.players[player.index()];
                slot.message.clone_from(&orders.message);
                slot.orders = orders;
                Ok(())
            }
            Err(source) => {
                tracing::warn!(%player, error = %source, "Rejected orders");
                self.eliminate(player, Elimination::FatalOrder(source.kind()))?;
                Err(GameError::RejectedOrders { player, source })
            }
        }
    }

    /// Record that a player did not answer in time. The player is
    /// eliminated.
    pub fn time_out(&mut self, player: PlayerId) -> Result<()> {
        self.eliminate(player, Elimination::TimedOut)
    }

    /// Remove a player from the match: their factories turn neutral, their
    /// troops vanish and their score drops to 0. Bombs already launched
    /// stay in flight. Eliminating an eliminated player does nothing.
    pub fn eliminate(&mut self, player: PlayerId, reason: Elimination) -> Result<()> {
        if let Some(event) = self.remove_player(player, reason)? {
            self.pending_events.push(event);
        }
        Ok(())
    }

    fn remove_player(&mut self, player: PlayerId, reason: Elimination) -> Result<Option<RoundEvent>> {
        let slot = self
            .players
            .get_mut(player.index())
            .ok_or(GameError::UnknownPlayer(player))?;
        if !slot.is_alive() {
            return Ok(None);
        }
        slot.eliminated = Some(reason);
        slot.score = 0;
        slot.message = None;
        slot.orders = TurnOrders::default();

        for factory in self.factories.iter_mut().filter(|f| f.owner.is(player)) {
            factory.owner = Owner::Neutral;
        }
        self.troops.retain(|t| t.owner != player);

        tracing::warn!(%player, ?reason, round = self.round, "Player eliminated");
        Ok(Some(RoundEvent::PlayerEliminated { player, reason }))
    }

    // -- Round engine ---------------------------------------------------------

    /// Submit one round of raw outputs, one per player (`None` for a
    /// time-out), then resolve the round.
    ///
    /// Fatal orders eliminate their sender and are reported in the returned
    /// round's events; they are not an error here.
    pub fn play_round(&mut self, outputs: &[Option<&str>]) -> Result<RoundReport> {
        for (idx, output) in outputs.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let player = PlayerId(idx as u8);
            let submitted = match output {
                Some(raw) => self.submit_orders(player, raw),
                None => self.time_out(player),
            };
            match submitted {
                Ok(()) | Err(GameError::RejectedOrders { .. }) => {}
                Err(err) => return Err(err),
            }
        }
        self.step()
    }

    /// Resolve one round with the orders submitted so far.
    ///
    /// Phases, in order:
    /// 1. Troops and bombs advance.
    /// 2. Disable countdowns tick down.
    /// 3. Bomb orders, then move orders, then increase orders, each in
    ///    ascending player id.
    /// 4. Owned factories produce.
    /// 5. Arrived troops fight.
    /// 6. Arrived bombs detonate.
    /// 7. Scores are recomputed and exhausted players eliminated.
    ///
    /// Once the match is over this resolves nothing and returns the final
    /// verdict.
    ///
    /// # Errors
    ///
    /// [`GameError::InvariantViolation`] if the state is inconsistent. The
    /// state should be discarded after such an error.
    pub fn step(&mut self) -> Result<RoundReport> {
        let mut events = std::mem::take(&mut self.pending_events);
        self.verdict = check_victory(&self.players);
        if self.verdict.is_over() {
            return Ok(RoundReport {
                round: self.round,
                produced: 0,
                events,
                verdict: self.verdict,
            });
        }

        self.round += 1;
        let round = self.round;
        self.new_troops.clear();
        self.new_bombs.clear();

        movement_system(&mut self.troops, &mut self.bombs, round)?;
        recovery_system(&mut self.factories);

        let orders: Vec<(PlayerId, TurnOrders)> = self
            .players
            .iter_mut()
            .filter(|p| p.is_alive())
            .map(|p| (p.id, std::mem::take(&mut p.orders)))
            .collect();
        for (player, turn) in &orders {
            self.launch_bombs(*player, &turn.bombs, &mut events)?;
        }
        for (player, turn) in &orders {
            self.dispatch_troops(*player, &turn.moves, &mut events)?;
        }
        for (player, turn) in &orders {
            self.increase_production(*player, &turn.increases, &mut events)?;
        }
        for slot in &mut self.players {
            slot.last_orders = TurnOrders::default();
        }
        for (player, turn) in orders {
            self.players[player.index()].last_orders = turn;
        }

        let produced = production_system(&mut self.factories, round)?;

        let arrivals = arrival_system(&mut self.troops, self.factories.len(), round)?;
        for captured in battle_system(&mut self.factories, &arrivals) {
            let capture = captured.capture;
            tracing::debug!(
                round,
                factory = captured.factory,
                player = %capture.player,
                units = capture.units,
                "Factory captured"
            );
            events.push(RoundEvent::FactoryCaptured {
                player: capture.player,
                factory: captured.factory,
                previous: capture.previous,
                units: capture.units,
            });
        }

        for detonation in bomb_system(&mut self.bombs, &mut self.factories, round)? {
            tracing::debug!(
                round,
                factory = detonation.factory,
                damage = detonation.damage,
                "Bomb detonated"
            );
            events.push(RoundEvent::BombDetonated {
                owner: detonation.owner,
                bomb: detonation.bomb,
                factory: detonation.factory,
                target_owner: detonation.target_owner,
                damage: detonation.damage,
            });
        }

        score_system(&self.factories, &self.troops, &mut self.players, round)?;
        for player in exhausted_players(&self.factories, &self.players) {
            if let Some(event) = self.remove_player(player, Elimination::Exhausted)? {
                events.push(event);
            }
        }

        self.verdict = check_victory(&self.players);
        if let Verdict::MatchOver(outcome) = self.verdict {
            tracing::info!(round, ?outcome, scores = ?self.scores(), "Match over");
        }

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(round, state_hash = hash, "Match state hash");
        }

        Ok(RoundReport {
            round,
            produced,
            events,
            verdict: self.verdict,
        })
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        id
    }

    fn violation(&self, message: String) -> GameError {
        GameError::InvariantViolation {
            round: self.round,
            message,
        }
    }

    fn travel_time(&self, route: Route) -> Result<u32> {
        self.distances
            .get(route.source, route.destination)
            .ok_or(GameError::UnknownFactory(route.destination))
    }

    fn launched_this_round(&self, route: Route) -> bool {
        self.new_bombs().any(|bomb| bomb.route == route)
    }

    fn launch_bombs(
        &mut self,
        player: PlayerId,
        orders: &[BombOrder],
        events: &mut Vec<RoundEvent>,
    ) -> Result<()> {
        for order in orders {
            let budget = self.players[player.index()].remaining_bombs;
            if budget == 0 || self.launched_this_round(order.route) {
                continue;
            }
            let remaining_turns = self.travel_time(order.route)?;
            let id = self.allocate_id();
            self.bombs.push(Bomb {
                id,
                owner: player,
                route: order.route,
                remaining_turns,
            });
            self.new_bombs.push(id);
            self.players[player.index()].remaining_bombs = budget - 1;
            events.push(RoundEvent::BombLaunched {
                player,
                bomb: id,
                route: order.route,
            });
        }
        Ok(())
    }

    fn dispatch_troops(
        &mut self,
        player: PlayerId,
        orders: &[MoveOrder],
        events: &mut Vec<RoundEvent>,
    ) -> Result<()> {
        for order in orders {
            let route = order.route;
            let source = self
                .factories
                .get_mut(route.source as usize)
                .ok_or(GameError::UnknownFactory(route.source))?;
            if !source.owner.is(player) {
                let message = format!("player {player} moved from factory {}", source.id);
                return Err(self.violation(message));
            }

            let units = order.units.min(source.units);
            if units == 0 {
                continue;
            }
            source.units -= units;

            if self.launched_this_round(route) {
                events.push(RoundEvent::MoveBlockedByBomb {
                    player,
                    route,
                    units,
                });
                continue;
            }

            let merged = self
                .troops
                .iter_mut()
                .find(|t| self.new_troops.contains(&t.id) && t.route == route);
            let troop = match merged {
                Some(troop) => {
                    troop.units += units;
                    troop.id
                }
                None => {
                    let remaining_turns = self.travel_time(route)?;
                    let id = self.allocate_id();
                    self.troops.push(Troop {
                        id,
                        owner: player,
                        route,
                        units,
                        remaining_turns,
                    });
                    self.new_troops.push(id);
                    id
                }
            };
            events.push(RoundEvent::TroopDispatched {
                player,
                troop,
                route,
                units,
            });
        }
        Ok(())
    }

    fn increase_production(
        &mut self,
        player: PlayerId,
        orders: &[IncreaseOrder],
        events: &mut Vec<RoundEvent>,
    ) -> Result<()> {
        for order in orders {
            let factory = self
                .factories
                .get_mut(order.factory as usize)
                .ok_or(GameError::UnknownFactory(order.factory))?;
            if !factory.owner.is(player) {
                let message = format!("player {player} upgraded factory {}", factory.id);
                return Err(self.violation(message));
            }
            if factory.units >= COST_INCREASE_PRODUCTION && factory.can_grow() {
                factory.units -= COST_INCREASE_PRODUCTION;
                factory.production_rate += 1;
                events.push(RoundEvent::ProductionIncreased {
                    player,
                    factory: factory.id,
                    rate: factory.production_rate,
                });
            }
        }
        Ok(())
    }

    // -- Snapshots ------------------------------------------------------------

    /// Hash of the full state for desync detection. Equal states hash equal.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.round.hash(&mut hasher);
        self.factories.hash(&mut hasher);
        self.troops.hash(&mut hasher);
        self.bombs.hash(&mut hasher);
        self.players.hash(&mut hasher);
        self.next_entity_id.hash(&mut hasher);
        self.verdict.hash(&mut hasher);
        hasher.finish()
    }

    /// Encode the state for replay or storage.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] if encoding fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize match: {e}")))
    }

    /// Decode a state produced by [`serialize`](Self::serialize).
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] if the bytes are not a valid
    /// snapshot.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize match: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::bomb_damage;
    use crate::config::{League, DAMAGE_DURATION};
    use crate::error::{OrderError, OrderErrorKind};
    use crate::geometry::Point;

    const P0: PlayerId = PlayerId(0);
    const P1: PlayerId = PlayerId(1);

    /// Neutral centre, one home each, one neutral; everything 2 rounds apart.
    fn small_match(rules: Ruleset) -> MatchState {
        let factories = vec![
            Factory::new(0, Owner::Neutral, Point::CENTER, 0, 0),
            Factory::new(1, Owner::Player(P0), Point::new(2000, 2000), 20, 1),
            Factory::new(2, Owner::Player(P1), Point::new(14000, 4500), 20, 1),
            Factory::new(3, Owner::Neutral, Point::new(4000, 1000), 2, 2),
        ];
        MatchState::from_parts(factories, DistanceTable::uniform(4, 2), rules).unwrap()
    }

    #[test]
    fn initial_scores_and_ids() {
        let state = small_match(Ruleset::default());
        assert_eq!(state.scores(), vec![20, 20]);
        assert_eq!(state.round(), 0);
        assert_eq!(state.next_entity_id, 4);
    }

    #[test]
    fn from_parts_rejects_bad_tables() {
        let factories = vec![Factory::new(0, Owner::Neutral, Point::CENTER, 0, 0)];
        let result = MatchState::from_parts(factories, DistanceTable::uniform(2, 1), Ruleset::default());
        assert!(matches!(result, Err(GameError::InvalidConfig(_))));

        let factories = vec![Factory::new(5, Owner::Neutral, Point::CENTER, 0, 0)];
        let result = MatchState::from_parts(factories, DistanceTable::uniform(1, 1), Ruleset::default());
        assert!(result.is_err());

        let factories = vec![Factory::new(0, Owner::Player(PlayerId(4)), Point::CENTER, 0, 0)];
        let result = MatchState::from_parts(factories, DistanceTable::uniform(1, 1), Ruleset::default());
        assert!(result.is_err());
    }

    #[test]
    fn wait_only_produces() {
        let mut state = small_match(Ruleset::default());
        let report = state.play_round(&[Some("WAIT"), Some("WAIT")]).unwrap();
        assert_eq!(report.round, 1);
        assert_eq!(report.produced, 2);
        assert!(report.events.is_empty());
        assert_eq!(report.verdict, Verdict::Ongoing);
        assert_eq!(state.scores(), vec![21, 21]);
    }

    #[test]
    fn move_travels_and_captures() {
        let mut state = small_match(Ruleset::default());
        let report = state.play_round(&[Some("MOVE 1 3 10"), Some("WAIT")]).unwrap();
        assert_eq!(
            report.events,
            vec![RoundEvent::TroopDispatched {
                player: P0,
                troop: 4,
                route: Route::new(1, 3),
                units: 10
            }]
        );
        assert_eq!(state.factory(1).unwrap().units, 11);
        assert_eq!(state.troops()[0].remaining_turns, 2);
        assert_eq!(state.new_troops().count(), 1);

        state.play_round(&[Some("WAIT"), Some("WAIT")]).unwrap();
        assert_eq!(state.new_troops().count(), 0);
        let report = state.play_round(&[Some("WAIT"), Some("WAIT")]).unwrap();

        // Neutral 3 had 2 units and does not produce.
        let factory = state.factory(3).unwrap();
        assert_eq!(factory.owner, Owner::Player(P0));
        assert_eq!(factory.units, 8);
        assert!(report.events_for(P0).any(|e| matches!(e, RoundEvent::FactoryCaptured { .. })));
        assert_eq!(report.events_for(P1).count(), 0);
        assert!(state.troops().is_empty());
    }

    #[test]
    fn move_clamps_to_garrison() {
        let mut state = small_match(Ruleset::default());
        state.play_round(&[Some("MOVE 1 3 500"), Some("WAIT")]).unwrap();
        assert_eq!(state.troops()[0].units, 20);
        // Production still happens after the move.
        assert_eq!(state.factory(1).unwrap().units, 1);
    }

    #[test]
    fn same_route_moves_merge() {
        let mut state = small_match(Ruleset::default());
        let report = state
            .play_round(&[Some("MOVE 1 3 4;MOVE 1 3 5"), Some("WAIT")])
            .unwrap();
        assert_eq!(state.troops().len(), 1);
        assert_eq!(state.troops()[0].units, 9);
        assert_eq!(report.events.len(), 2);
    }

    #[test]
    fn bomb_blocks_same_route_move_after_deduction() {
        let mut state = small_match(Ruleset::default());
        let report = state
            .play_round(&[Some("BOMB 1 2;MOVE 1 2 5"), Some("WAIT")])
            .unwrap();
        assert_eq!(state.bombs().len(), 1);
        assert!(state.troops().is_empty());
        assert_eq!(state.factory(1).unwrap().units, 16);
        assert!(report.events.contains(&RoundEvent::MoveBlockedByBomb {
            player: P0,
            route: Route::new(1, 2),
            units: 5
        }));
        assert_eq!(state.player(P0).unwrap().remaining_bombs, 1);
    }

    #[test]
    fn duplicate_bomb_route_is_dropped() {
        let mut state = small_match(Ruleset::default());
        state.play_round(&[Some("BOMB 1 2;BOMB 1 2"), Some("WAIT")]).unwrap();
        assert_eq!(state.bombs().len(), 1);
        assert_eq!(state.player(P0).unwrap().remaining_bombs, 1);
    }

    #[test]
    fn bomb_budget_is_enforced() {
        let mut state = small_match(Ruleset::default());
        state
            .play_round(&[Some("BOMB 1 2;BOMB 1 3;BOMB 1 0"), Some("WAIT")])
            .unwrap();
        assert_eq!(state.bombs().len(), 2);
        assert_eq!(state.player(P0).unwrap().remaining_bombs, 0);
    }

    #[test]
    fn bomb_detonates_and_disables() {
        let mut state = small_match(Ruleset::default());
        state.play_round(&[Some("BOMB 1 2"), Some("WAIT")]).unwrap();
        state.play_round(&[Some("WAIT"), Some("WAIT")]).unwrap();
        let before = state.factory(2).unwrap().units;
        let report = state.play_round(&[Some("WAIT"), Some("WAIT")]).unwrap();
        let factory = state.factory(2).unwrap();
        assert_eq!(factory.disabled, DAMAGE_DURATION);
        // Production ran before the detonation.
        let stock = before + 1;
        assert_eq!(factory.units, stock - bomb_damage(stock));
        assert!(report.events_for(P1).any(|e| matches!(e, RoundEvent::BombDetonated { .. })));
        assert!(state.bombs().is_empty());
    }

    #[test]
    fn increase_spends_units() {
        let mut state = small_match(Ruleset::default());
        let report = state.play_round(&[Some("INC 1"), Some("WAIT")]).unwrap();
        let factory = state.factory(1).unwrap();
        assert_eq!(factory.production_rate, 2);
        assert_eq!(factory.units, 20 - 10 + 2);
        assert_eq!(
            report.events,
            vec![RoundEvent::ProductionIncreased {
                player: P0,
                factory: 1,
                rate: 2
            }]
        );
    }

    #[test]
    fn fatal_orders_eliminate() {
        let mut state = small_match(Ruleset::default());
        let err = state.submit_orders(P0, "MOVE 1 3 5;MOVE 99 1 5").unwrap_err();
        assert!(matches!(
            err,
            GameError::RejectedOrders {
                player: P0,
                source: OrderError::OutOfRange { .. }
            }
        ));
        let player = state.player(P0).unwrap();
        assert_eq!(
            player.eliminated,
            Some(Elimination::FatalOrder(OrderErrorKind::InvalidReference))
        );
        assert_eq!(player.score, 0);
        assert_eq!(state.factory(1).unwrap().owner, Owner::Neutral);

        let report = state.step().unwrap();
        assert!(state.troops().is_empty());
        assert_eq!(report.verdict, Verdict::MatchOver(Outcome::Winner(P1)));
        assert_eq!(report.round, 0);
        assert_eq!(
            report.events,
            vec![RoundEvent::PlayerEliminated {
                player: P0,
                reason: Elimination::FatalOrder(OrderErrorKind::InvalidReference)
            }]
        );
    }

    #[test]
    fn time_out_eliminates_and_keeps_bombs() {
        let mut state = small_match(Ruleset::default());
        state.play_round(&[Some("BOMB 1 2;MOVE 1 3 5"), Some("WAIT")]).unwrap();
        let report = state.play_round(&[None, Some("WAIT")]).unwrap();
        assert!(state.troops().is_empty());
        assert_eq!(state.bombs().len(), 1);
        assert_eq!(report.verdict, Verdict::MatchOver(Outcome::Winner(P1)));
        assert!(state.is_over());
        assert_eq!(state.final_outcome(), Outcome::Winner(P1));
    }

    #[test]
    fn from_parts_rejects_zero_distance() {
        let factories = vec![
            Factory::new(0, Owner::Player(P0), Point::CENTER, 5, 1),
            Factory::new(1, Owner::Player(P1), Point::new(1000, 1000), 5, 1),
            Factory::new(2, Owner::Neutral, Point::new(2000, 1000), 0, 0),
        ];
        let mut distances = DistanceTable::uniform(3, 2);
        distances.set(1, 2, 0);
        let result = MatchState::from_parts(factories, distances, Ruleset::default());
        assert!(matches!(result, Err(GameError::InvalidConfig(_))));
    }

    #[test]
    fn generated_map_scores_start_from_garrisons() {
        let state = MatchState::new(&MatchConfig::new(3)).unwrap();
        let scores = state.scores();
        assert!(scores[0] > 0);
        assert_eq!(scores[0], scores[1]);
    }

    #[test]
    fn eliminated_player_message_is_cleared() {
        let mut state = small_match(Ruleset::default());
        state.submit_orders(P1, "WAIT;MSG bye").unwrap();
        assert_eq!(state.player(P1).unwrap().message.as_deref(), Some("bye"));

        state.time_out(P1).unwrap();
        assert_eq!(state.player(P1).unwrap().message, None);
    }

    #[test]
    fn resolved_orders_are_kept_after_the_round() {
        let mut state = small_match(Ruleset::default());
        state
            .play_round(&[Some("MOVE 1 3 5;INC 1;MSG go"), Some("BOMB 2 1")])
            .unwrap();

        let p0 = state.player(P0).unwrap();
        assert!(p0.orders.is_empty());
        assert_eq!(p0.last_orders.moves.len(), 1);
        assert_eq!(p0.last_orders.increases.len(), 1);
        assert_eq!(p0.last_orders.message.as_deref(), Some("go"));
        assert_eq!(state.player(P1).unwrap().last_orders.bombs.len(), 1);

        state.play_round(&[Some("WAIT"), Some("WAIT")]).unwrap();
        assert!(state.player(P0).unwrap().last_orders.is_empty());
        assert!(state.player(P1).unwrap().last_orders.is_empty());
    }

    #[test]
    fn dead_player_orders_are_ignored() {
        let mut state = small_match(Ruleset::default());
        state.time_out(P1).unwrap();
        assert!(state.submit_orders(P1, "JUMP").is_ok());
        assert!(state.submit_orders(PlayerId(7), "WAIT").is_err());
    }

    #[test]
    fn message_is_stored() {
        let mut state = small_match(Ruleset::default());
        state.submit_orders(P0, "WAIT;MSG gl hf").unwrap();
        assert_eq!(state.player(P0).unwrap().message.as_deref(), Some("gl hf"));
        state.submit_orders(P0, "WAIT").unwrap();
        assert_eq!(state.player(P0).unwrap().message, None);
    }

    #[test]
    fn exhausted_player_is_eliminated() {
        let factories = vec![
            Factory::new(0, Owner::Player(P0), Point::CENTER, 0, 0),
            Factory::new(1, Owner::Player(P1), Point::new(1000, 1000), 5, 1),
        ];
        let mut state =
            MatchState::from_parts(factories, DistanceTable::uniform(2, 3), Ruleset::default())
                .unwrap();
        let report = state.play_round(&[Some("WAIT"), Some("WAIT")]).unwrap();
        assert_eq!(report.verdict, Verdict::MatchOver(Outcome::Winner(P1)));
        assert_eq!(
            state.player(P0).unwrap().eliminated,
            Some(Elimination::Exhausted)
        );
    }

    #[test]
    fn move_restriction_league() {
        let mut state = small_match(Ruleset::for_league(League::Wood3));
        state
            .play_round(&[Some("MOVE 1 3 4;MOVE 1 0 4"), Some("WAIT")])
            .unwrap();
        assert_eq!(state.troops().len(), 1);
    }

    #[test]
    fn snapshot_roundtrip_and_hash() {
        let mut state = small_match(Ruleset::default());
        state.play_round(&[Some("MOVE 1 3 4"), Some("BOMB 2 1")]).unwrap();
        let bytes = state.serialize().unwrap();
        let restored = MatchState::deserialize(&bytes).unwrap();
        assert_eq!(restored, state);
        assert_eq!(restored.state_hash(), state.state_hash());
        assert!(MatchState::deserialize(&[1, 2, 3]).is_err());
    }

    #[test]
    fn step_after_match_over_is_inert() {
        let mut state = small_match(Ruleset::default());
        state.time_out(P0).unwrap();
        state.step().unwrap();
        let hash = state.state_hash();
        let report = state.step().unwrap();
        assert!(report.events.is_empty());
        assert_eq!(state.state_hash(), hash);
    }
}
