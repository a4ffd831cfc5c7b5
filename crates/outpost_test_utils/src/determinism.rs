//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a match produces identical results
//! given identical inputs.
//!
//! # Testing Strategy
//!
//! Replays, tournament re-runs and published seeds all rely on a match being
//! a pure function of its config and orders. Sources of non-determinism
//! include:
//!
//! - **Floating-point math**: distances and travel times are integer-only.
//! - **HashMap iteration order**: state is kept in `Vec`s in creation order.
//! - **System randomness**: the only RNG is the seeded map generator.
//!
//! Two checks are offered: a `DefaultHasher` state hash (cheap, for
//! round-by-round comparison) and the canonical bincode encoding (exact,
//! for final states).

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use outpost_core::simulation::MatchState;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of rounds played.
    pub rounds: u32,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic match).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the match was deterministic, with a detailed message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Match is non-deterministic!\n\
                 Runs: {}\n\
                 Rounds: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.rounds,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a match several times and compare final state hashes.
///
/// # Arguments
///
/// * `runs` - Number of times to play the match
/// * `rounds` - Rounds to play per run
/// * `setup` - Creates the initial state
/// * `step` - Plays one round
/// * `hash` - Hashes the state
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    rounds: u32,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();
        for _ in 0..rounds {
            step(&mut state);
        }
        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        rounds,
    }
}

/// Play `rounds` rounds, ignoring engine errors (the state is compared
/// afterwards either way).
fn play<Round>(state: &mut MatchState, rounds: u32, round: &Round)
where
    Round: Fn(&mut MatchState) -> outpost_core::error::Result<()>,
{
    for _ in 0..rounds {
        if state.is_over() {
            break;
        }
        if let Err(err) = round(state) {
            tracing::warn!(error = %err, "Round failed during determinism run");
            break;
        }
    }
}

/// Play a match twice and compare the canonical encodings of the final
/// states byte for byte.
pub fn verify_match_determinism<Setup, Round>(setup: Setup, round: Round, rounds: u32) -> bool
where
    Setup: Fn() -> MatchState,
    Round: Fn(&mut MatchState) -> outpost_core::error::Result<()>,
{
    let mut first = setup();
    let mut second = setup();
    play(&mut first, rounds, &round);
    play(&mut second, rounds, &round);

    match (canonical_bytes(&first), canonical_bytes(&second)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Result of parallel match runs.
#[derive(Debug, Clone)]
pub struct ParallelMatchResult {
    /// Final state hash of each match.
    pub hashes: Vec<u64>,
    /// Rounds each match ran.
    pub rounds: u32,
}

impl ParallelMatchResult {
    /// Check if all matches produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }
}

/// Play the same match on several threads and collect final hashes.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_matches<Setup, Round>(
    setup: Setup,
    round: Round,
    matches: usize,
    rounds: u32,
) -> ParallelMatchResult
where
    Setup: Fn() -> MatchState + Sync,
    Round: Fn(&mut MatchState) -> outpost_core::error::Result<()> + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..matches)
            .map(|_| {
                s.spawn(|| {
                    let mut state = setup();
                    play(&mut state, rounds, &round);
                    state.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|_| panic!("match thread panicked")))
            .collect()
    });

    ParallelMatchResult { hashes, rounds }
}

/// Play two copies round by round and report the first round whose state
/// hashes differ.
pub fn find_first_divergence<Setup, Round>(setup: Setup, round: Round, rounds: u32) -> Option<u32>
where
    Setup: Fn() -> MatchState,
    Round: Fn(&mut MatchState) -> outpost_core::error::Result<()>,
{
    let mut first = setup();
    let mut second = setup();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for n in 1..=rounds {
        let a = round(&mut first);
        let b = round(&mut second);
        if a.is_err() != b.is_err() || first.state_hash() != second.state_hash() {
            tracing::debug!(round = n, "States diverged");
            return Some(n);
        }
        if first.is_over() {
            break;
        }
    }

    None
}

/// Verify that a snapshot round trip preserves the state exactly.
pub fn verify_serialization_determinism<Setup, Round>(
    setup: Setup,
    round: Round,
    rounds: u32,
) -> bool
where
    Setup: Fn() -> MatchState,
    Round: Fn(&mut MatchState) -> outpost_core::error::Result<()>,
{
    let mut state = setup();
    play(&mut state, rounds, &round);

    let Ok(bytes) = state.serialize() else {
        return false;
    };
    let Ok(restored) = MatchState::deserialize(&bytes) else {
        return false;
    };
    restored.state_hash() == state.state_hash() && restored == state
}

/// Canonical byte encoding of a state.
#[must_use]
pub fn canonical_bytes(state: &MatchState) -> Option<Vec<u8>> {
    bincode::serialize(state).ok()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}
