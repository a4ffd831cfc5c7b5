//! Precomputed travel times between every pair of factories.

use serde::{Deserialize, Serialize};

use crate::entities::{EntityId, Factory};
use crate::geometry::travel_time;

/// Square matrix of travel times in rounds, indexed by factory id.
///
/// Built once per match. Lookups are O(1); the diagonal is 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DistanceTable {
    size: usize,
    turns: Vec<u32>,
}

impl DistanceTable {
    /// Compute travel times from factory positions.
    #[must_use]
    pub fn from_factories(factories: &[Factory], radius: u32) -> Self {
        Self::from_fn(factories.len(), |a, b| {
            let d2 = factories[a].position.distance_squared(factories[b].position);
            travel_time(d2, radius * 2)
        })
    }

    /// Build from a function of `(from, to)` indices. The diagonal is forced
    /// to 0; `f` is only called for distinct pairs.
    pub fn from_fn(size: usize, mut f: impl FnMut(usize, usize) -> u32) -> Self {
        let mut turns = vec![0; size * size];
        for a in 0..size {
            for b in 0..size {
                if a != b {
                    turns[a * size + b] = f(a, b);
                }
            }
        }
        Self { size, turns }
    }

    /// Every distinct pair `distance` rounds apart.
    #[must_use]
    pub fn uniform(size: usize, distance: u32) -> Self {
        Self::from_fn(size, |_, _| distance)
    }

    /// Overwrite the travel time between `a` and `b`, both directions.
    /// Out-of-range or identical ids are ignored.
    pub fn set(&mut self, a: EntityId, b: EntityId, distance: u32) {
        let (a, b) = (a as usize, b as usize);
        if a != b && a < self.size && b < self.size {
            self.turns[a * self.size + b] = distance;
            self.turns[b * self.size + a] = distance;
        }
    }

    /// Travel time from `from` to `to`, if both are on the map.
    #[must_use]
    pub fn get(&self, from: EntityId, to: EntityId) -> Option<u32> {
        let (from, to) = (from as usize, to as usize);
        if from < self.size && to < self.size {
            Some(self.turns[from * self.size + to])
        } else {
            None
        }
    }

    /// Number of factories covered.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.size
    }

    /// Whether the table covers no factories.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Unordered pairs `(a, b, distance)` with `a < b`, in id order.
    pub fn links(&self) -> impl Iterator<Item = (EntityId, EntityId, u32)> + '_ {
        (0..self.size).flat_map(move |a| {
            (a + 1..self.size).map(move |b| {
                #[allow(clippy::cast_possible_truncation)]
                let ids = (a as EntityId, b as EntityId);
                (ids.0, ids.1, self.turns[a * self.size + b])
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Owner;
    use crate::geometry::Point;

    #[test]
    fn uniform_table() {
        let table = DistanceTable::uniform(3, 4);
        assert_eq!(table.get(0, 1), Some(4));
        assert_eq!(table.get(2, 0), Some(4));
        assert_eq!(table.get(1, 1), Some(0));
        assert_eq!(table.get(3, 0), None);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn set_is_symmetric() {
        let mut table = DistanceTable::uniform(3, 4);
        table.set(0, 2, 7);
        assert_eq!(table.get(0, 2), Some(7));
        assert_eq!(table.get(2, 0), Some(7));
        table.set(1, 1, 9);
        assert_eq!(table.get(1, 1), Some(0));
    }

    #[test]
    fn links_cover_each_pair_once() {
        let table = DistanceTable::from_fn(4, |a, b| (a + b) as u32);
        let links: Vec<_> = table.links().collect();
        assert_eq!(links.len(), 6);
        assert_eq!(links[0], (0, 1, 1));
        assert_eq!(links[5], (2, 3, 5));
    }

    #[test]
    fn from_positions() {
        let factories = vec![
            Factory::new(0, Owner::Neutral, Point::new(0, 0), 0, 0),
            Factory::new(1, Owner::Neutral, Point::new(3000, 0), 0, 0),
        ];
        // 3000 - 1400 = 1600 -> 2 rounds.
        let table = DistanceTable::from_factories(&factories, 700);
        assert_eq!(table.get(0, 1), Some(2));
        assert_eq!(table.get(1, 0), Some(2));
    }
}
