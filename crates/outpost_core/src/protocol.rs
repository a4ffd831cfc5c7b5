//! Line-oriented text a player reads.
//!
//! Init input, sent once:
//!
//! ```text
//! <factory count>
//! <link count>
//! <a> <b> <distance>        one per pair, a < b
//! ```
//!
//! Turn input, sent every round:
//!
//! ```text
//! <entity count>
//! <id> <TYPE> <a1> <a2> <a3> <a4> <a5>
//! ```
//!
//! | TYPE    | a1               | a2     | a3          | a4        | a5        |
//! |---------|------------------|--------|-------------|-----------|-----------|
//! | FACTORY | owner (1/-1/0)   | units  | rate        | disabled  | 0         |
//! | TROOP   | owner            | source | destination | units     | remaining |
//! | BOMB    | owner            | source | destination | remaining | 0         |
//!
//! An enemy bomb hides its destination and timing: `-1 <source> -1 -1 0`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entities::{EntityId, PlayerId};
use crate::simulation::MatchState;

/// Entity type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// `FACTORY`
    Factory,
    /// `TROOP`
    Troop,
    /// `BOMB`
    Bomb,
}

impl EntityKind {
    const fn tag(self) -> &'static str {
        match self {
            Self::Factory => "FACTORY",
            Self::Troop => "TROOP",
            Self::Bomb => "BOMB",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One entity line of turn input, from a particular player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityLine {
    /// Entity id.
    pub id: EntityId,
    /// Type tag.
    pub kind: EntityKind,
    /// Type-specific arguments.
    pub args: [i64; 5],
}

impl fmt::Display for EntityLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a1, a2, a3, a4, a5] = self.args;
        write!(f, "{} {} {a1} {a2} {a3} {a4} {a5}", self.id, self.kind)
    }
}

/// Error parsing an [`EntityLine`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid entity line '{0}'")]
pub struct EntityLineError(pub String);

impl FromStr for EntityLine {
    type Err = EntityLineError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let err = || EntityLineError(line.to_string());
        let mut tokens = line.split_whitespace();
        let id = tokens.next().and_then(|t| t.parse().ok()).ok_or_else(err)?;
        let kind = match tokens.next() {
            Some("FACTORY") => EntityKind::Factory,
            Some("TROOP") => EntityKind::Troop,
            Some("BOMB") => EntityKind::Bomb,
            _ => return Err(err()),
        };
        let mut args = [0i64; 5];
        for arg in &mut args {
            *arg = tokens.next().and_then(|t| t.parse().ok()).ok_or_else(err)?;
        }
        if tokens.next().is_some() {
            return Err(err());
        }
        Ok(Self { id, kind, args })
    }
}

/// Lines sent to every player before the first round.
#[must_use]
pub fn init_input(state: &MatchState) -> Vec<String> {
    let links: Vec<String> = state
        .distances()
        .links()
        .map(|(a, b, distance)| format!("{a} {b} {distance}"))
        .collect();

    let mut lines = Vec::with_capacity(links.len() + 2);
    lines.push(state.factories().len().to_string());
    lines.push(links.len().to_string());
    lines.extend(links);
    lines
}

/// Entity lines as `viewer` sees them: factories, then troops, then bombs.
#[must_use]
pub fn visible_entities(state: &MatchState, viewer: PlayerId) -> Vec<EntityLine> {
    let factories = state.factories().iter().map(|f| EntityLine {
        id: f.id,
        kind: EntityKind::Factory,
        args: [
            i64::from(f.owner.relative_to(viewer)),
            i64::from(f.units),
            i64::from(f.production_rate),
            i64::from(f.disabled),
            0,
        ],
    });

    let troops = state.troops().iter().map(|t| EntityLine {
        id: t.id,
        kind: EntityKind::Troop,
        args: [
            if t.owner == viewer { 1 } else { -1 },
            i64::from(t.route.source),
            i64::from(t.route.destination),
            i64::from(t.units),
            i64::from(t.remaining_turns),
        ],
    });

    let bombs = state.bombs().iter().map(|b| {
        let args = if b.owner == viewer {
            [
                1,
                i64::from(b.route.source),
                i64::from(b.route.destination),
                i64::from(b.remaining_turns),
                0,
            ]
        } else {
            [-1, i64::from(b.route.source), -1, -1, 0]
        };
        EntityLine {
            id: b.id,
            kind: EntityKind::Bomb,
            args,
        }
    });

    factories.chain(troops).chain(bombs).collect()
}

/// Lines sent to `viewer` at the start of every round.
#[must_use]
pub fn turn_input(state: &MatchState, viewer: PlayerId) -> Vec<String> {
    let entities = visible_entities(state, viewer);
    let mut lines = Vec::with_capacity(entities.len() + 1);
    lines.push(entities.len().to_string());
    lines.extend(entities.iter().map(ToString::to_string));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Ruleset;
    use crate::distance::DistanceTable;
    use crate::entities::{Factory, Owner};
    use crate::geometry::Point;

    fn state() -> MatchState {
        let factories = vec![
            Factory::new(0, Owner::Neutral, Point::CENTER, 0, 0),
            Factory::new(1, Owner::Player(PlayerId(0)), Point::new(1000, 1000), 20, 2),
            Factory::new(2, Owner::Player(PlayerId(1)), Point::new(15000, 5500), 20, 2),
        ];
        let mut distances = DistanceTable::uniform(3, 3);
        distances.set(1, 2, 7);
        MatchState::from_parts(factories, distances, Ruleset::default()).unwrap()
    }

    #[test]
    fn init_lists_each_link_once() {
        let lines = init_input(&state());
        assert_eq!(lines, vec!["3", "3", "0 1 3", "0 2 3", "1 2 7"]);
    }

    #[test]
    fn factories_are_relative_to_viewer() {
        let state = state();
        let p0 = turn_input(&state, PlayerId(0));
        assert_eq!(p0[0], "3");
        assert_eq!(p0[1], "0 FACTORY 0 0 0 0 0");
        assert_eq!(p0[2], "1 FACTORY 1 20 2 0 0");
        assert_eq!(p0[3], "2 FACTORY -1 20 2 0 0");

        let p1 = turn_input(&state, PlayerId(1));
        assert_eq!(p1[2], "1 FACTORY -1 20 2 0 0");
        assert_eq!(p1[3], "2 FACTORY 1 20 2 0 0");
    }

    #[test]
    fn troops_and_bombs_follow_factories() {
        let mut state = state();
        state
            .play_round(&[Some("MOVE 1 0 5;BOMB 1 2"), Some("WAIT")])
            .unwrap();

        let p0 = turn_input(&state, PlayerId(0));
        assert_eq!(p0[0], "5");
        assert_eq!(p0[4], "4 TROOP 1 1 0 5 3");
        assert_eq!(p0[5], "3 BOMB 1 1 2 7 0");

        let p1 = turn_input(&state, PlayerId(1));
        assert_eq!(p1[4], "4 TROOP -1 1 0 5 3");
        assert_eq!(p1[5], "3 BOMB -1 1 -1 -1 0");
    }

    #[test]
    fn entity_line_parses_back() {
        let line: EntityLine = "12 TROOP -1 3 4 17 2".parse().unwrap();
        assert_eq!(line.id, 12);
        assert_eq!(line.kind, EntityKind::Troop);
        assert_eq!(line.args, [-1, 3, 4, 17, 2]);
        assert_eq!(line.to_string(), "12 TROOP -1 3 4 17 2");

        assert!("12 SHIP 1 2 3 4 5".parse::<EntityLine>().is_err());
        assert!("12 TROOP 1 2 3".parse::<EntityLine>().is_err());
        assert!("12 TROOP 1 2 3 4 5 6".parse::<EntityLine>().is_err());
    }
}
