//! Integer geometry for factory placement and travel times.
//!
//! Positions are whole world units. Distances are compared squared and the
//! one rounding step needed for travel time is done exactly in integers, so
//! nothing here touches floating point.

use serde::{Deserialize, Serialize};

use crate::config::{DISTANCE_PER_ROUND, MAP_HEIGHT, MAP_WIDTH};

/// A position in world units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate.
    pub y: i32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Centre of the map.
    pub const CENTER: Self = Self {
        x: MAP_WIDTH / 2,
        y: MAP_HEIGHT / 2,
    };

    /// Squared Euclidean distance.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> u64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        (dx * dx + dy * dy).unsigned_abs()
    }

    /// Reflection through the map centre.
    #[must_use]
    pub const fn mirrored(self) -> Self {
        Self {
            x: MAP_WIDTH - self.x,
            y: MAP_HEIGHT - self.y,
        }
    }
}

/// Rounds needed to cross the gap between two factory rims.
///
/// Equals `round_half_up((sqrt(distance_squared) - radius_sum) / 800)`,
/// clamped at zero. Rather than taking a square root, this finds the
/// largest `k` with `800k - 400 + radius_sum <= sqrt(distance_squared)`,
/// comparing squares.
#[must_use]
pub fn travel_time(distance_squared: u64, radius_sum: u32) -> u32 {
    let step = u64::from(DISTANCE_PER_ROUND);
    let half_step = step / 2;
    let radius_sum = u64::from(radius_sum);

    let mut turns = 0u32;
    loop {
        let reach = step * u64::from(turns + 1) + radius_sum;
        let threshold = reach.saturating_sub(half_step);
        if threshold.saturating_mul(threshold) <= distance_squared {
            turns += 1;
        } else {
            return turns;
        }
    }
}
