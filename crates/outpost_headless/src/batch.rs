//! Batch runner for map and balance checks.
//!
//! Plays one scenario over a range of seeds in parallel using rayon and
//! summarises outcomes and map statistics.

use std::path::Path;
use std::time::Instant;

use outpost_core::config::PLAYER_COUNT;
use outpost_core::entities::{Owner, PlayerId};
use outpost_core::simulation::MatchState;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::protocol::EndReason;
use crate::runner::{winner, MatchRunner, MatchSummary};
use crate::scenario::Scenario;

/// Configuration for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Scenario to replay; its seed is replaced per game.
    pub scenario: Scenario,
    /// Number of games to run.
    pub game_count: u32,
    /// Maximum parallel games (0 = use rayon default).
    pub parallel_games: u32,
    /// Seed of the first game; game `i` uses `seed_start + i`.
    pub seed_start: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            scenario: Scenario::default(),
            game_count: 100,
            parallel_games: 0,
            seed_start: 0,
        }
    }
}

impl BatchConfig {
    /// Config for a scenario.
    pub fn new(scenario: Scenario, game_count: u32) -> Self {
        Self {
            scenario,
            game_count,
            ..Default::default()
        }
    }

    /// Set seed start.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set the worker count.
    pub fn with_parallelism(mut self, games: u32) -> Self {
        self.parallel_games = games;
        self
    }
}

/// Shape of a generated map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapStats {
    /// Factories on the map.
    pub factory_count: usize,
    /// Sum of all production rates.
    pub total_production: u32,
    /// Travel time between the two home factories.
    pub home_distance: Option<u32>,
}

impl MapStats {
    /// Stats of a match at its start.
    pub fn of(state: &MatchState) -> Self {
        let home = |player: PlayerId| {
            state
                .factories()
                .iter()
                .find(|f| f.owner == Owner::Player(player))
                .map(|f| f.id)
        };
        let home_distance = match (home(PlayerId(0)), home(PlayerId(1))) {
            (Some(a), Some(b)) => state.distances().get(a, b),
            _ => None,
        };
        Self {
            factory_count: state.factories().len(),
            total_production: state.factories().iter().map(|f| f.production_rate).sum(),
            home_distance,
        }
    }
}

/// One finished game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Game index in the batch.
    pub game_index: u32,
    /// Map seed.
    pub seed: u64,
    /// Map shape.
    pub map: MapStats,
    /// Match result.
    pub summary: MatchSummary,
}

/// Error during batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Game index.
    pub game_index: u32,
    /// Seed used.
    pub seed: u64,
    /// Error message.
    pub message: String,
}

/// Aggregate over all finished games.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Games finished.
    pub total_games: u32,
    /// Wins per player.
    pub wins: Vec<u32>,
    /// Drawn games.
    pub draws: u32,
    /// Games stopped by the round cap.
    pub round_cap_games: u32,
    /// Mean rounds played.
    pub average_rounds: f64,
    /// Mean factory count.
    pub average_factories: f64,
    /// Mean total production.
    pub average_total_production: f64,
}

impl BatchSummary {
    /// Summarise a set of games.
    pub fn from_games(games: &[GameRecord]) -> Self {
        let mut summary = Self {
            wins: vec![0; PLAYER_COUNT],
            ..Self::default()
        };
        if games.is_empty() {
            return summary;
        }

        let mut rounds = 0u64;
        let mut factories = 0u64;
        let mut production = 0u64;
        for game in games {
            summary.total_games += 1;
            match winner(&game.summary) {
                Some(player) => {
                    if let Some(w) = summary.wins.get_mut(player.index()) {
                        *w += 1;
                    }
                }
                None => summary.draws += 1,
            }
            if game.summary.reason == EndReason::RoundCap {
                summary.round_cap_games += 1;
            }
            rounds += u64::from(game.summary.rounds);
            factories += game.map.factory_count as u64;
            production += u64::from(game.map.total_production);
        }

        let n = games.len() as f64;
        summary.average_rounds = rounds as f64 / n;
        summary.average_factories = factories as f64 / n;
        summary.average_total_production = production as f64 / n;
        summary
    }

    /// Share of finished games won by `player`.
    pub fn win_rate(&self, player: PlayerId) -> f64 {
        let wins = self.wins.get(player.index()).copied().unwrap_or(0);
        f64::from(wins) / f64::from(self.total_games.max(1))
    }
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used.
    pub config: BatchConfig,
    /// Individual games, in index order.
    pub games: Vec<GameRecord>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Total runtime.
    pub duration_seconds: f64,
    /// Errors encountered.
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

fn run_single_game(scenario: &Scenario, game_index: u32, seed: u64) -> Result<GameRecord, String> {
    let scenario = scenario.clone().with_seed(seed);
    let mut runner = MatchRunner::from_scenario(&scenario).map_err(|e| e.to_string())?;
    let map = MapStats::of(runner.state());
    let summary = runner.run_quiet().map_err(|e| e.to_string())?;
    Ok(GameRecord {
        game_index,
        seed,
        map,
        summary,
    })
}

fn play_all(config: &BatchConfig) -> Vec<Result<GameRecord, BatchError>> {
    (0..config.game_count)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed_start.wrapping_add(u64::from(i));
            run_single_game(&config.scenario, i, seed).map_err(|message| {
                warn!(game = i, seed, error = %message, "Game failed");
                BatchError {
                    game_index: i,
                    seed,
                    message,
                }
            })
        })
        .collect()
}

/// Run a batch of games.
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    info!(
        games = config.game_count,
        scenario = %config.scenario.name,
        seed_start = config.seed_start,
        "Starting batch run"
    );

    let results = if config.parallel_games > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build()
        {
            Ok(pool) => pool.install(|| play_all(&config)),
            Err(e) => {
                warn!(error = %e, "Failed to build thread pool, using the global one");
                play_all(&config)
            }
        }
    } else {
        play_all(&config)
    };

    let (games, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let games: Vec<GameRecord> = games.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();
    debug!(?summary, "Batch summary");
    info!(
        "Batch complete: {} games in {:.1}s ({} failed)",
        games.len(),
        duration_seconds,
        errors.len()
    );

    BatchResults {
        config,
        games,
        summary,
        duration_seconds,
        errors,
    }
}

/// Play the same scenario several times and check every run agrees.
pub fn verify_determinism(scenario: &Scenario, runs: u32) -> bool {
    let mut first: Option<MatchSummary> = None;
    for run in 0..runs {
        let summary = match MatchRunner::from_scenario(scenario).and_then(|mut r| r.run_quiet()) {
            Ok(summary) => summary,
            Err(e) => {
                warn!(run, error = %e, "Determinism run failed");
                return false;
            }
        };
        match &first {
            None => first = Some(summary),
            Some(expected) if *expected != summary => {
                warn!(run, "Run diverged");
                return false;
            }
            Some(_) => {}
        }
    }
    true
}
