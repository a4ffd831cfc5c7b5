//! Seeded random number generation for map generation.
//!
//! A 48-bit linear congruential generator with the same constants and
//! bounded-draw rejection loop as `java.util.Random`, so seeds stay
//! compatible with maps published for existing tooling.

const MULTIPLIER: u64 = 0x5DEE_CE66D;
const INCREMENT: u64 = 0xB;
const MASK: u64 = (1 << 48) - 1;

/// Deterministic RNG owned by one map generation run.
#[derive(Debug, Clone)]
pub struct MapRng {
    state: u64,
}

impl MapRng {
    /// Create a generator from a seed. Only the low 48 bits are significant.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: (seed ^ MULTIPLIER) & MASK,
        }
    }

    /// Advance the state and return the top `bits` bits (1..=32).
    fn next_bits(&mut self, bits: u32) -> i32 {
        self.state = self
            .state
            .wrapping_mul(MULTIPLIER)
            .wrapping_add(INCREMENT)
            & MASK;
        // Truncation to the low 32 bits is the point: the value is
        // reinterpreted as a signed int.
        #[allow(clippy::cast_possible_truncation)]
        let value = (self.state >> (48 - bits)) as u32 as i32;
        value
    }

    /// Uniform draw in `[0, bound)`. Returns 0 when `bound` is 0.
    pub fn next_below(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        let bound = i32::try_from(bound).unwrap_or(i32::MAX);

        let mut r = self.next_bits(31);
        let m = bound - 1;
        if bound & m == 0 {
            // Power of two: take the high bits.
            r = ((i64::from(bound) * i64::from(r)) >> 31) as i32;
        } else {
            let mut u = r;
            loop {
                r = u % bound;
                // Overflow here means u landed in the biased tail; redraw.
                if u.wrapping_sub(r).wrapping_add(m) >= 0 {
                    break;
                }
                u = self.next_bits(31);
            }
        }
        r.unsigned_abs()
    }

    /// Uniform draw in `[min, max]` (inclusive). Always consumes a draw,
    /// even when the range holds a single value.
    pub fn next_in_range(&mut self, min: u32, max: u32) -> u32 {
        if max < min {
            return min;
        }
        min + self.next_below(max - min + 1)
    }
}
